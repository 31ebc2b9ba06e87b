//! Reusable UI component helpers
//!
//! Shared building blocks for the section boxes and popups in mod.rs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Centered popup area sized as a percentage of the parent rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Single-line text input with a trailing cursor when focused
pub fn input_line(label: &str, value: &str, focused: bool, text: Color, accent: Color) -> Line<'static> {
    let cursor = if focused { "_" } else { "" };
    let label_style = if focused {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(text)
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(format!("{}{}", value, cursor), Style::default().fg(text)),
    ])
}

/// Checkbox line, `[x] Label (code)` style
pub fn checkbox_line(
    checked: bool,
    label: &str,
    code: &str,
    highlighted: bool,
    text: Color,
    dim: Color,
    bg: Color,
) -> Line<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    let style = if highlighted {
        Style::default().fg(text).bg(bg)
    } else {
        Style::default().fg(text)
    };
    Line::from(vec![
        Span::styled(format!(" {} ", mark), style),
        Span::styled(label.to_string(), style),
        Span::styled(format!(" ({})", code), Style::default().fg(dim)),
    ])
}
