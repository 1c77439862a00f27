// src/core/style.rs

use crate::models::StylingConfig;
use colored::{Color, ColoredString, Colorize};

/// The `[styling]` palette resolved to terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_config(&StylingConfig::default())
    }
}

fn color(name: &str, fallback: Color) -> Color {
    name.trim().parse().unwrap_or_else(|_| {
        log::warn!("Unknown color '{}' in styling configuration", name);
        fallback
    })
}

impl Palette {
    pub fn from_config(styling: &StylingConfig) -> Self {
        Self {
            primary: color(&styling.primary, Color::Blue),
            secondary: color(&styling.secondary, Color::Cyan),
            success: color(&styling.success, Color::Green),
            warning: color(&styling.warning, Color::Yellow),
            error: color(&styling.error, Color::Red),
            info: color(&styling.info, Color::White),
        }
    }

    pub fn header(&self, text: &str) -> ColoredString {
        text.color(self.primary).bold()
    }

    pub fn highlight(&self, text: &str) -> ColoredString {
        text.color(self.secondary)
    }

    pub fn success(&self, text: &str) -> ColoredString {
        text.color(self.success)
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        text.color(self.warning)
    }

    pub fn error(&self, text: &str) -> ColoredString {
        text.color(self.error).bold()
    }

    pub fn info(&self, text: &str) -> ColoredString {
        text.color(self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_follows_the_configuration() {
        let mut styling = StylingConfig::default();
        styling.primary = "magenta".to_string();
        styling.error = "not-a-color".to_string();

        let palette = Palette::from_config(&styling);

        assert_eq!(palette.primary, Color::Magenta);
        assert_eq!(palette.error, Color::Red);
        assert_eq!(Palette::default().success, Color::Green);
    }
}
