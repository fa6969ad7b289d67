//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

use crate::legend::Rgba;

/// Which palette to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Theme {
    /// Detect from the terminal background.
    #[default]
    Auto,
    Dark,
    Light,
}

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Opportunity index colors (traffic light pattern)
    pub score_high: Color,
    pub score_mid: Color,
    pub score_low: Color,
    pub bar_empty: Color,

    // Table colors
    pub row_alt_bg: Color,
    pub index_color: Color,
    pub header_style: Style,
    pub row_selected: Style,
    pub compared_marker: Color,

    // General colors
    pub muted: Color,
    pub title_color: Color,
    pub warning: Color,

    // Tab colors
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,
    pub popup_bg: Color,

    // Map background
    pub canvas_bg: Color,
}

impl ThemeColors {
    /// Dark theme palette
    pub fn dark() -> Self {
        Self {
            score_high: Color::Green,
            score_mid: Color::Yellow,
            score_low: Color::Red,
            bar_empty: Color::DarkGray,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            compared_marker: Color::Cyan,
            muted: Color::Gray,
            title_color: Color::Cyan,
            warning: Color::Yellow,
            tab_active_style: Style::new().fg(Color::Cyan).bold(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            popup_bg: Color::Indexed(234),
            canvas_bg: Color::Reset,
        }
    }

    /// Light theme palette
    pub fn light() -> Self {
        Self {
            score_high: Color::Rgb(0, 110, 0),
            score_mid: Color::Rgb(160, 110, 0),
            score_low: Color::Rgb(170, 0, 0),
            bar_empty: Color::Indexed(250),
            row_alt_bg: Color::Indexed(254),
            index_color: Color::Indexed(243),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            compared_marker: Color::Blue,
            muted: Color::Indexed(242),
            title_color: Color::Blue,
            warning: Color::Rgb(160, 90, 0),
            tab_active_style: Style::new().fg(Color::Blue).bold(),
            tab_inactive_style: Style::new().fg(Color::Indexed(245)),
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_success: Color::Rgb(0, 110, 0),
            flash_error: Color::Rgb(170, 0, 0),
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
            popup_bg: Color::Indexed(255),
            canvas_bg: Color::Reset,
        }
    }

    /// Color for an opportunity index in 0-1.
    pub fn score_color(&self, index: f64) -> Color {
        if index >= 0.7 {
            self.score_high
        } else if index >= 0.4 {
            self.score_mid
        } else {
            self.score_low
        }
    }
}

/// Map legend colors onto terminal colors; alpha is dropped.
pub fn to_color(rgba: Rgba) -> Color {
    Color::Rgb(rgba.r, rgba.g, rgba.b)
}

/// Pick the palette, probing the terminal background for `Theme::Auto`.
pub fn resolve_theme(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Dark => ThemeColors::dark(),
        Theme::Light => ThemeColors::light(),
        Theme::Auto => match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => {
                log::debug!("Terminal background luma {:.2}, using light theme", luma);
                ThemeColors::light()
            }
            Ok(_) => ThemeColors::dark(),
            Err(e) => {
                log::debug!("Could not detect terminal background ({}), using dark theme", e);
                ThemeColors::dark()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_color_bands() {
        let theme = ThemeColors::dark();
        assert_eq!(theme.score_color(0.9), Color::Green);
        assert_eq!(theme.score_color(0.5), Color::Yellow);
        assert_eq!(theme.score_color(0.1), Color::Red);
    }

    #[test]
    fn test_explicit_theme_skips_detection() {
        assert_eq!(resolve_theme(Theme::Light).title_color, Color::Blue);
        assert_eq!(resolve_theme(Theme::Dark).title_color, Color::Cyan);
    }

    #[test]
    fn test_to_color_drops_alpha() {
        assert_eq!(to_color(Rgba::new(1, 2, 3, 4)), Color::Rgb(1, 2, 3));
    }
}
