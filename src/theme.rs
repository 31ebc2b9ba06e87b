//! Theme colors for the UI
//! Reads hex overrides from ~/.config/archet/theme.toml

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,       // Active borders, highlights
    pub danger: Color,       // Errors, destructive hints
    pub success: Color,      // Saved/ok indicators
    pub warning: Color,      // Status line feedback
    pub text: Color,         // Primary text
    pub text_dim: Color,     // Dimmed text, hints
    pub bg_selected: Color,  // Selection background
    pub inactive: Color,     // Inactive borders
    pub header: Color,       // Column/header text
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
        }
    }
}

impl Theme {
    /// Load theme, preferring the user's theme.toml
    pub fn load() -> Self {
        if let Some(theme) = Self::load_user_theme() {
            return theme;
        }
        Self::default()
    }

    /// Load color overrides from ~/.config/archet/theme.toml
    ///
    /// The file is a flat `[colors]` table of role = "#rrggbb" entries;
    /// unknown roles are ignored, missing roles keep their defaults.
    fn load_user_theme() -> Option<Self> {
        let path = dirs::config_dir()?.join("archet").join("theme.toml");
        let content = fs::read_to_string(path).ok()?;
        let value: toml::Value = match content.parse() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to parse theme.toml: {}", e);
                return None;
            }
        };

        let colors: HashMap<String, Color> = value
            .get("colors")?
            .as_table()?
            .iter()
            .filter_map(|(role, v)| {
                let hex = v.as_str()?;
                Some((role.clone(), parse_hex_color(hex)?))
            })
            .collect();

        let mut theme = Theme::default();
        let mut apply = |role: &str, slot: &mut Color| {
            if let Some(color) = colors.get(role) {
                *slot = *color;
            }
        };
        apply("accent", &mut theme.accent);
        apply("danger", &mut theme.danger);
        apply("success", &mut theme.success);
        apply("warning", &mut theme.warning);
        apply("text", &mut theme.text);
        apply("text_dim", &mut theme.text_dim);
        apply("bg_selected", &mut theme.bg_selected);
        apply("inactive", &mut theme.inactive);
        apply("header", &mut theme.header);
        Some(theme)
    }
}

/// Parse "#rrggbb" (leading '#' optional) into a Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
