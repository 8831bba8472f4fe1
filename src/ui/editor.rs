//! Inline profile editor state.
//!
//! `set-bio` switches the session into a small field-walk form: arrow keys
//! move between rows (wrapping), Enter starts editing a text row or
//! activates Save/Cancel. The app applies the result; this module only
//! tracks form state.

use crate::core::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Nickname,
    Bio,
    Avatar,
    Save,
    Cancel,
}

const FIELDS: &[EditorField] = &[
    EditorField::Nickname,
    EditorField::Bio,
    EditorField::Avatar,
    EditorField::Save,
    EditorField::Cancel,
];

impl EditorField {
    pub fn label(self) -> &'static str {
        match self {
            EditorField::Nickname => "DISPLAY NAME",
            EditorField::Bio => "BIO",
            EditorField::Avatar => "AVATAR ART",
            EditorField::Save => "[ SAVE ]",
            EditorField::Cancel => "[ CANCEL ]",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            EditorField::Nickname | EditorField::Bio | EditorField::Avatar
        )
    }
}

/// What Enter on the current row means for the app.
#[derive(Debug, PartialEq, Eq)]
pub enum EditorAction {
    /// Entered or left inline edit on a text row; nothing to persist yet.
    Edited,
    Save,
    Cancel,
}

#[derive(Debug, Default)]
pub struct ProfileEditor {
    selected: usize,
    /// Inline edit buffer when a text row is being edited.
    editing: Option<String>,
    pub display_name: String,
    pub bio: String,
    pub avatar_art: String,
}

impl ProfileEditor {
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        let mut editor = Self::default();
        if let Some(profile) = profile {
            editor.display_name = profile.display_name.clone();
            editor.bio = profile.bio.clone().unwrap_or_default();
            editor.avatar_art = profile.avatar_art.clone().unwrap_or_default();
        }
        editor
    }

    pub fn fields(&self) -> &'static [EditorField] {
        FIELDS
    }

    pub fn field(&self) -> EditorField {
        FIELDS[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn buffer(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn value_of(&self, field: EditorField) -> &str {
        match field {
            EditorField::Nickname => &self.display_name,
            EditorField::Bio => &self.bio,
            EditorField::Avatar => &self.avatar_art,
            _ => "",
        }
    }

    pub fn select_next(&mut self) {
        if self.editing.is_none() {
            self.selected = (self.selected + 1) % FIELDS.len();
        }
    }

    pub fn select_previous(&mut self) {
        if self.editing.is_none() {
            self.selected = self.selected.checked_sub(1).unwrap_or(FIELDS.len() - 1);
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(buffer) = &mut self.editing {
            buffer.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = &mut self.editing {
            buffer.pop();
        }
    }

    /// Abandon the inline edit without committing the buffer.
    pub fn abort_edit(&mut self) {
        self.editing = None;
    }

    /// Enter on the current row. Text rows toggle inline editing (the second
    /// Enter commits the buffer); Save and Cancel bubble up to the app.
    pub fn activate(&mut self) -> EditorAction {
        match self.field() {
            field if field.is_text() => {
                match self.editing.take() {
                    Some(buffer) => {
                        match field {
                            EditorField::Nickname => self.display_name = buffer,
                            EditorField::Bio => self.bio = buffer,
                            EditorField::Avatar => self.avatar_art = buffer,
                            _ => unreachable!(),
                        }
                    }
                    None => self.editing = Some(self.value_of(field).to_string()),
                }
                EditorAction::Edited
            }
            EditorField::Save => EditorAction::Save,
            EditorField::Cancel => EditorAction::Cancel,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_wraps_in_both_directions() {
        let mut editor = ProfileEditor::default();
        assert_eq!(editor.field(), EditorField::Nickname);
        editor.select_previous();
        assert_eq!(editor.field(), EditorField::Cancel);
        editor.select_next();
        assert_eq!(editor.field(), EditorField::Nickname);
    }

    #[test]
    fn editing_a_text_row_commits_on_second_enter() {
        let mut editor = ProfileEditor::default();
        editor.select_next(); // Bio
        assert_eq!(editor.activate(), EditorAction::Edited);
        assert!(editor.is_editing());

        for ch in "hi".chars() {
            editor.push_char(ch);
        }
        editor.backspace();
        editor.push_char('i');
        assert_eq!(editor.activate(), EditorAction::Edited);
        assert!(!editor.is_editing());
        assert_eq!(editor.bio, "hi");
    }

    #[test]
    fn navigation_is_locked_while_editing_and_escape_aborts() {
        let mut editor = ProfileEditor::default();
        editor.activate();
        editor.push_char('x');
        editor.select_next();
        assert_eq!(editor.field(), EditorField::Nickname);

        editor.abort_edit();
        assert_eq!(editor.display_name, "");
        editor.select_next();
        assert_eq!(editor.field(), EditorField::Bio);
    }

    #[test]
    fn save_and_cancel_rows_bubble_up() {
        let mut editor = ProfileEditor::default();
        editor.select_previous(); // Cancel
        assert_eq!(editor.activate(), EditorAction::Cancel);
        editor.select_previous(); // Save
        assert_eq!(editor.activate(), EditorAction::Save);
    }
}
