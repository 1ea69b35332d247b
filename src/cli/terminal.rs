//! Terminal capability detection and colouring

use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Check if terminal is narrow (< 60 columns)
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// A value that changed (amber)
    fn changed(&self) -> String;
    /// Identifiers and headings (blue)
    fn info(&self) -> String;
    /// Emphasis
    fn strong(&self) -> String;
    /// Secondary text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn changed(&self) -> String {
        paint(self, |text| text.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        paint(self, |text| text.fg::<css::LightBlue>().to_string())
    }

    fn strong(&self) -> String {
        paint(self, |text| text.bold().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |text| text.dimmed().to_string())
    }
}

impl Colorize for String {
    fn changed(&self) -> String {
        self.as_str().changed()
    }

    fn info(&self) -> String {
        self.as_str().info()
    }

    fn strong(&self) -> String {
        self.as_str().strong()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
