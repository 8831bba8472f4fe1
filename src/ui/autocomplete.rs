//! Tab completion for the input line.
//!
//! Suggestions are computed from the input line alone; the chat loop decides
//! whether to commit a single match directly or open the cycling menu.
//! Priority order: an open `@(` mention token wins, then emoticon
//! shortcodes, then command names, then a command's fixed argument
//! vocabulary.

use crate::commands::registry::{self, COMMANDS};
use crate::core::session::Mode;
use crate::utils::emoji;

/// Compute completion candidates for the current line.
///
/// `participants` are the display names seen in the current conversation and
/// feed mention completion.
pub fn suggest(line: &str, mode: Mode, participants: &[String]) -> Vec<String> {
    // An unclosed @( token completes against broadcast participants. Direct
    // chats have a fixed peer, so mention completion stays radio-only.
    if mode == Mode::Broadcast {
        if let Some(pos) = line.rfind("@(") {
            let term = &line[pos + 2..];
            if !term.contains(')') {
                let term = term.to_lowercase();
                return participants
                    .iter()
                    .filter(|name| name.to_lowercase().starts_with(&term))
                    .map(|name| format!("@({name})"))
                    .collect();
            }
        }
    }

    let current = line.rsplit(' ').next().unwrap_or("");

    if current.starts_with('(') {
        let term = current.to_lowercase();
        return emoji::codes()
            .filter(|code| code.starts_with(&term))
            .map(|code| code.to_string())
            .collect();
    }

    let words: Vec<&str> = line.split(' ').collect();
    match words.as_slice() {
        [first] if !first.is_empty() => registry::completions_for(first)
            .into_iter()
            .map(String::from)
            .collect(),
        [first, second] => {
            let term = second.to_lowercase();
            COMMANDS
                .iter()
                .find(|spec| spec.name.eq_ignore_ascii_case(first))
                .map(|spec| {
                    spec.subcommands
                        .iter()
                        .filter(|sub| sub.starts_with(&term))
                        .map(|sub| sub.to_string())
                        .collect()
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Replace the fragment being completed with `selection` and append a space.
pub fn commit(line: &str, selection: &str) -> String {
    if selection.starts_with("@(") {
        if let Some(pos) = line.rfind("@(") {
            return format!("{}{selection} ", &line[..pos]);
        }
    }
    match line.rfind(' ') {
        Some(idx) => format!("{}{selection} ", &line[..=idx]),
        None => format!("{selection} "),
    }
}

/// The cycling completion menu. Tab advances, arrows move both ways, and
/// movement wraps at either end.
#[derive(Debug, Default)]
pub struct CompletionMenu {
    options: Vec<String>,
    selected: usize,
    open: bool,
}

impl CompletionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self, options: Vec<String>) {
        debug_assert!(options.len() > 1);
        self.options = options;
        self.selected = 0;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.options.clear();
        self.selected = 0;
    }

    pub fn next(&mut self) {
        if self.open {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }

    pub fn previous(&mut self) {
        if self.open {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.options.len() - 1);
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.open.then(|| self.options[self.selected].as_str())
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}
