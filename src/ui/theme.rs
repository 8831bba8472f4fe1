//! Terminal color palettes.
//!
//! Five fixed palettes named after classic phosphor and monitor looks. The
//! theme id is what `theme <name>` takes and what gets persisted in config.

use crate::ui::transcript::LineKind;
use ratatui::style::{Color, Modifier, Style};

pub const THEME_IDS: &[&str] = &["green", "amber", "blue", "white", "matrix"];

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub id: &'static str,
    /// Default foreground, also the prompt color.
    pub main: Color,
    pub dim: Color,
    pub system: Color,
    pub error: Color,
    pub alert: Color,
    pub chat: Color,
    pub radio: Color,
}

pub const GREEN: Theme = Theme {
    id: "green",
    main: Color::Rgb(0x33, 0xff, 0x33),
    dim: Color::Rgb(0x11, 0x88, 0x11),
    system: Color::Rgb(0x88, 0xff, 0x88),
    error: Color::Rgb(0xff, 0x55, 0x55),
    alert: Color::Rgb(0xff, 0xff, 0x55),
    chat: Color::Rgb(0x55, 0xff, 0xff),
    radio: Color::Rgb(0xff, 0xaa, 0x33),
};

pub const AMBER: Theme = Theme {
    id: "amber",
    main: Color::Rgb(0xff, 0xb0, 0x00),
    dim: Color::Rgb(0x99, 0x66, 0x00),
    system: Color::Rgb(0xff, 0xd7, 0x66),
    error: Color::Rgb(0xff, 0x55, 0x55),
    alert: Color::Rgb(0xff, 0xff, 0x88),
    chat: Color::Rgb(0xff, 0xe0, 0xb0),
    radio: Color::Rgb(0xff, 0x88, 0x33),
};

pub const BLUE: Theme = Theme {
    id: "blue",
    main: Color::Rgb(0x66, 0xaa, 0xff),
    dim: Color::Rgb(0x33, 0x55, 0x99),
    system: Color::Rgb(0xaa, 0xcc, 0xff),
    error: Color::Rgb(0xff, 0x66, 0x66),
    alert: Color::Rgb(0xff, 0xff, 0x88),
    chat: Color::Rgb(0x88, 0xff, 0xff),
    radio: Color::Rgb(0xff, 0xaa, 0x55),
};

pub const WHITE: Theme = Theme {
    id: "white",
    main: Color::Rgb(0xee, 0xee, 0xee),
    dim: Color::Rgb(0x88, 0x88, 0x88),
    system: Color::Rgb(0xcc, 0xcc, 0xcc),
    error: Color::Rgb(0xff, 0x55, 0x55),
    alert: Color::Rgb(0xff, 0xff, 0x66),
    chat: Color::Rgb(0x99, 0xdd, 0xff),
    radio: Color::Rgb(0xff, 0xbb, 0x66),
};

pub const MATRIX: Theme = Theme {
    id: "matrix",
    main: Color::Rgb(0x00, 0xff, 0x41),
    dim: Color::Rgb(0x00, 0x77, 0x22),
    system: Color::Rgb(0x66, 0xff, 0x99),
    error: Color::Rgb(0xff, 0x41, 0x41),
    alert: Color::Rgb(0xd0, 0xff, 0x41),
    chat: Color::Rgb(0x41, 0xff, 0xd0),
    radio: Color::Rgb(0xff, 0xd0, 0x41),
};

const THEMES: &[Theme] = &[GREEN, AMBER, BLUE, WHITE, MATRIX];

pub fn by_id(id: &str) -> Option<Theme> {
    THEMES
        .iter()
        .find(|theme| theme.id.eq_ignore_ascii_case(id))
        .copied()
}

impl Default for Theme {
    fn default() -> Self {
        GREEN
    }
}

impl Theme {
    pub fn style_for(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::Plain => Style::default().fg(self.main),
            LineKind::System => Style::default().fg(self.system),
            LineKind::Error => Style::default().fg(self.error),
            LineKind::Alert => Style::default()
                .fg(self.alert)
                .add_modifier(Modifier::BOLD),
            LineKind::ChatOwn => Style::default().fg(self.main),
            LineKind::ChatPeer => Style::default().fg(self.chat),
            LineKind::RadioOwn => Style::default().fg(self.main),
            LineKind::RadioPeer => Style::default().fg(self.radio),
            LineKind::Art => Style::default().fg(self.dim),
        }
    }

    pub fn prompt_style(&self) -> Style {
        Style::default().fg(self.main).add_modifier(Modifier::BOLD)
    }

    pub fn menu_style(&self, selected: bool) -> Style {
        if selected {
            Style::default()
                .fg(Color::Black)
                .bg(self.main)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.dim)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_covers_all_ids() {
        for id in THEME_IDS {
            assert_eq!(by_id(id).map(|t| t.id), Some(*id));
            assert_eq!(by_id(&id.to_uppercase()).map(|t| t.id), Some(*id));
        }
        assert!(by_id("sepia").is_none());
    }
}
