//! Terminal styling shared by the commands

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::Display;

/// Check mark printed for completed actions
pub const CHECK: &str = "✓";

/// Semantic styles; colors are dropped when stdout is not a terminal
pub trait Stylize: Display {
    /// De-emphasized detail
    fn muted(&self) -> String {
        self.styled(Style::new().dimmed())
    }

    /// Names the user should notice (steps, tags, files)
    fn emphasis(&self) -> String {
        self.styled(Style::new().bold())
    }

    /// Counts and identifiers
    fn accent(&self) -> String {
        self.styled(Style::new().cyan())
    }

    /// Completed actions
    fn success(&self) -> String {
        self.styled(Style::new().green())
    }

    /// Something needs attention
    fn warn(&self) -> String {
        self.styled(Style::new().yellow())
    }

    /// Apply `style` when the terminal supports it
    fn styled(&self, style: Style) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |s| s.style(style))
            .to_string()
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Styled list arrow
pub fn arrow() -> String {
    "→".muted()
}

/// Spinner used while git runs
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}
