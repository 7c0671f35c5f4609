//! Theme colors, with optional overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,     // Borders of the focused box, header title
    pub user: Color,       // Your own message labels
    pub assistant: Color,  // Assistant message labels and typing cursor
    pub danger: Color,     // Validation errors
    pub text: Color,       // Message bodies
    pub text_dim: Color,   // Hints, status line, inactive borders
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired defaults
        Self {
            accent: Color::Rgb(137, 180, 250),
            user: Color::Rgb(250, 179, 135),
            assistant: Color::Rgb(166, 218, 149),
            danger: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
        }
    }
}

impl Theme {
    /// Defaults with every valid override applied; invalid colors are logged and skipped
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            ("accent", &config.accent, &mut theme.accent),
            ("user", &config.user, &mut theme.user),
            ("assistant", &config.assistant, &mut theme.assistant),
            ("danger", &config.danger, &mut theme.danger),
            ("text", &config.text, &mut theme.text),
            ("text_dim", &config.text_dim, &mut theme.text_dim),
        ];

        for (key, value, slot) in overrides {
            let Some(value) = value else { continue };
            match Self::parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid theme.{} color: {}", key, value),
            }
        }

        theme
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
