//! Immutable theme values. Switching themes swaps the whole value; nothing
//! here is global or mutable.

use egui::Color32;
use session::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub kind: ThemeKind,
    pub bg: Color32,
    pub text: Color32,
    pub accent: Color32,
    pub input_bg: Color32,
    pub muted: Color32,
    pub error: Color32,
    pub search: Color32,
}

pub const DARK: Theme = Theme {
    kind: ThemeKind::Dark,
    bg: Color32::from_rgb(0x1E, 0x1E, 0x1E),
    text: Color32::from_rgb(0xFF, 0xFF, 0xFF),
    accent: Color32::from_rgb(0x4A, 0x90, 0xE2),
    input_bg: Color32::from_rgb(0x2D, 0x2D, 0x2D),
    muted: Color32::from_rgb(0xAA, 0xAA, 0xAA),
    error: Color32::from_rgb(0xFF, 0x66, 0x66),
    search: Color32::from_rgb(0x4C, 0xAF, 0x50),
};

pub const LIGHT: Theme = Theme {
    kind: ThemeKind::Light,
    bg: Color32::from_rgb(0xF5, 0xF5, 0xF5),
    text: Color32::from_rgb(0x33, 0x33, 0x33),
    accent: Color32::from_rgb(0x1E, 0x88, 0xE5),
    input_bg: Color32::from_rgb(0xFF, 0xFF, 0xFF),
    muted: Color32::from_rgb(0x88, 0x88, 0x88),
    error: Color32::from_rgb(0xFF, 0x44, 0x44),
    search: Color32::from_rgb(0x4C, 0xAF, 0x50),
};

impl Theme {
    /// The other theme value; pure, no shared state.
    pub fn toggled(self) -> Theme {
        match self.kind {
            ThemeKind::Dark => LIGHT,
            ThemeKind::Light => DARK,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.kind {
            ThemeKind::Dark => "🌙",
            ThemeKind::Light => "☀",
        }
    }

    pub fn color_for(&self, tag: Tag) -> Color32 {
        match tag {
            Tag::User => self.accent,
            Tag::Assistant => self.text,
            Tag::Thinking | Tag::System | Tag::Time => self.muted,
            Tag::Error => self.error,
            Tag::SearchResults => self.search,
        }
    }
}
