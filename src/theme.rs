use std::io::IsTerminal;

use anstyle::{AnsiColor, Color, Effects, RgbColor, Style};

/// Raw RGB tuple of the accent colour
pub const ACCENT_RGB: (u8, u8, u8) = (207, 106, 76);

pub const ACCENT: Style = Style::new().fg_color(Some(Color::Rgb(RgbColor(
    ACCENT_RGB.0,
    ACCENT_RGB.1,
    ACCENT_RGB.2,
))));
pub const SUCCESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
pub const FAILURE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
pub const WARNING: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
pub const INFO: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));
pub const DIM: Style = Style::new().effects(Effects::DIMMED);
pub const BOLD: Style = Style::new().effects(Effects::BOLD);

/// Applies styles to text, but only emits escape codes when colour is enabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    /// Colour enabled when stderr is a terminal.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            color: std::io::stderr().is_terminal(),
        }
    }

    /// Colour enabled when stdout is a terminal.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    #[must_use]
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[must_use]
    pub fn paint(&self, style: Style, s: &str) -> String {
        if self.color {
            format!("{style}{s}{style:#}")
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_painter_emits_no_escapes() {
        assert_eq!(Painter::plain().paint(FAILURE, "FAIL"), "FAIL");
    }

    #[test]
    fn test_color_painter_wraps_text() {
        let painted = Painter { color: true }.paint(SUCCESS, "PASS");
        assert!(painted.starts_with("\x1b["));
        assert!(painted.contains("PASS"));
        assert!(painted.ends_with("\x1b[0m"));
    }
}
