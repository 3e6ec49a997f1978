//! Color theme and styling definitions using ratatui colors

use crate::record::Vitality;
use ratatui::style::{Color, Modifier, Style};

/// Color theme for terminal UI elements
#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// Title / result count line
    pub title: Style,

    /// Table header row
    pub table_header: Style,

    /// Row under the cursor
    pub cursor_row: Style,

    /// Vitality tags
    pub alive_tag: Style,
    pub deceased_tag: Style,

    /// Emphasized print action on a row
    pub emphasized_action: Style,
    pub plain_action: Style,

    /// Status line colors
    pub status_bg: Color,
    pub status_fg: Color,

    /// Error/warning text
    pub error_text: Color,

    /// Placeholder panes (loading, no results)
    pub placeholder: Style,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            title: Style::default().add_modifier(Modifier::BOLD),
            table_header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            cursor_row: Style::default().fg(Color::White).bg(Color::Blue),
            alive_tag: Style::default().fg(Color::Green),
            deceased_tag: Style::default().fg(Color::Red),
            emphasized_action: Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
            plain_action: Style::default().fg(Color::Gray),
            status_bg: Color::Blue,
            status_fg: Color::White,
            error_text: Color::Red,
            placeholder: Style::default().fg(Color::DarkGray),
        }
    }
}

impl ColorTheme {
    /// Create a monochrome theme for terminals without color support
    pub fn monochrome() -> Self {
        Self {
            title: Style::default().add_modifier(Modifier::BOLD),
            table_header: Style::default().add_modifier(Modifier::UNDERLINED),
            cursor_row: Style::default().add_modifier(Modifier::REVERSED),
            alive_tag: Style::default(),
            deceased_tag: Style::default().add_modifier(Modifier::DIM),
            emphasized_action: Style::default().add_modifier(Modifier::BOLD),
            plain_action: Style::default(),
            status_bg: Color::Black,
            status_fg: Color::White,
            error_text: Color::White,
            placeholder: Style::default(),
        }
    }

    pub fn vitality_tag(&self, vitality: Vitality) -> Style {
        match vitality {
            Vitality::Alive => self.alive_tag,
            Vitality::Deceased => self.deceased_tag,
        }
    }
}
