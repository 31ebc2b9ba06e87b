mod components;

use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use serde_json::json;

use crate::app::{App, Overlay, Section, DETAIL_FIELDS};
use crate::dialog::{Alert, AlertKind, Dialog, DialogContent};
use crate::theme::Theme;
use components::{centered_rect, checkbox_line, input_line};

// Load theme colors once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let languages_height = if app.languages.is_open() {
        (app.languages.items().len() as u16).saturating_add(3)
    } else {
        3
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),              // Info line
            Constraint::Length(6),              // Details box
            Constraint::Min(6),                 // Author / Keywords row
            Constraint::Length(languages_height), // Languages box
            Constraint::Length(1),              // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_details_box(f, app, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    draw_author_box(f, app, middle[0]);
    draw_keywords_box(f, app, middle[1]);

    draw_languages_box(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    // Draw popups on top
    match &app.overlay {
        None => {}
        Some(Overlay::Dialog(dialog)) => draw_dialog_popup(f, app, dialog),
        Some(Overlay::Alert(alert)) => draw_alert_popup(f, alert),
        Some(Overlay::Help) => draw_help_popup(f),
    }
}

/// Renders a cached template fragment without touching the loader.
/// Missing fragments fall back to built-in text instead of spamming the
/// diagnostic log every frame.
fn fragment<T: serde::Serialize>(app: &App, id: &str, context: &T) -> Option<String> {
    if app.templates.has_template(id) {
        app.templates.render_cached(id, context)
    } else {
        None
    }
}

fn section_block(title: &str, active: bool) -> Block<'static> {
    let border_color = if active { accent() } else { inactive() };
    let title_style = if active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };
    Block::default()
        .title(Span::styled(format!(" {} ", title), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.clone(), Style::default().fg(warning())))
    } else if app.is_dirty() {
        Line::from(Span::styled(
            format!("{} (modified, press s to save)", app.file.display()),
            Style::default().fg(text_dim()),
        ))
    } else {
        Line::from(Span::styled(
            app.file.display().to_string(),
            Style::default().fg(text_dim()),
        ))
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_details_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Details;
    let block = section_block("Details", is_active);

    let lines: Vec<Line> = DETAIL_FIELDS
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = app.detail_value(*field);
            let value_span = if value.is_empty() {
                Span::styled("(not set)", Style::default().fg(text_dim()))
            } else {
                Span::styled(value.to_string(), Style::default().fg(text()))
            };
            let style = if is_active && i == app.details_cursor {
                Style::default().bg(bg_selected())
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!(" {:<18}", field.label()),
                    Style::default().fg(header()),
                ),
                value_span,
            ])
            .style(style)
        })
        .collect();

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn draw_author_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Author;
    let block = section_block("Original author", is_active);

    let header_text = fragment(
        app,
        "util|tableMap",
        &json!({ "panel_id": app.author.panel_id() }),
    )
    .unwrap_or_else(|| "Key = Value".to_string());

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        format!(" {}", header_text.lines().next().unwrap_or_default()),
        Style::default().fg(header()),
    ))];

    if app.author.rows().is_empty() {
        lines.push(Line::from(Span::styled(
            " No entries (a to add)",
            Style::default().fg(text_dim()),
        )));
    } else {
        for (i, row) in app.author.rows().iter().enumerate() {
            let rendered = fragment(
                app,
                "util|tableMap/row",
                &json!({
                    "panel_id": app.author.panel_id(),
                    "row_id": row.row_id,
                    "key": row.key,
                    "value": row.value,
                }),
            )
            .unwrap_or_else(|| format!("{} = {}", row.key, row.value));

            let style = if is_active && i == app.author.selected_index() {
                Style::default().fg(text()).bg(bg_selected())
            } else {
                Style::default().fg(text())
            };
            lines.push(Line::from(Span::styled(format!(" {}", rendered), style)));
        }
    }

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn draw_keywords_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Keywords;
    let block = section_block("Keywords", is_active);

    let hint = fragment(
        app,
        "util|stringList",
        &json!({ "panel_id": app.keywords.panel_id(), "size": app.keywords.size() }),
    )
    .unwrap_or_else(|| "a add · e edit · d remove".to_string());

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        format!(" {}", hint.lines().next().unwrap_or_default()),
        Style::default().fg(text_dim()),
    ))];

    let size = app.keywords.size() as usize;
    let selected = app.keywords.selected_index();
    let start = match selected {
        Some(s) if s + 1 > size => s + 1 - size,
        _ => 0,
    };

    if app.keywords.items().is_empty() {
        lines.push(Line::from(Span::styled(
            " No keywords (a to add)",
            Style::default().fg(text_dim()),
        )));
    } else {
        for (i, item) in app.keywords.items().iter().enumerate().skip(start).take(size) {
            let style = if is_active && selected == Some(i) {
                Style::default().fg(text()).bg(bg_selected())
            } else {
                Style::default().fg(text())
            };
            lines.push(Line::from(Span::styled(format!(" {}", item), style)));
        }
    }

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn draw_languages_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Languages;

    let title = fragment(
        app,
        "util|dropdownCheckboxList",
        &json!({ "panel_id": app.languages.panel_id(), "title": app.languages.title() }),
    )
    .map(|t| t.lines().next().unwrap_or_default().to_string())
    .unwrap_or_else(|| app.languages.title().to_string());

    let block = section_block(&title, is_active);

    let lines: Vec<Line> = if app.languages.is_open() {
        app.languages
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                checkbox_line(
                    item.checked,
                    &item.label,
                    &item.code,
                    is_active && i == app.languages.cursor(),
                    text(),
                    text_dim(),
                    bg_selected(),
                )
            })
            .collect()
    } else {
        let selected = app
            .languages
            .get_item_selection_list()
            .iter()
            .filter(|c| **c)
            .count();
        vec![Line::from(Span::styled(
            format!(
                " {} of {} selected",
                selected,
                app.languages.items().len()
            ),
            Style::default().fg(text_dim()),
        ))]
    };

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.section {
        Section::Details => vec![
            ("↑↓", "Nav"),
            ("Enter", "Edit"),
            ("Tab", "Next"),
            ("s", "Save"),
            ("?", "Help"),
        ],
        Section::Author => vec![
            ("↑↓", "Nav"),
            ("a", "Add"),
            ("e", "Edit"),
            ("d", "Del"),
            ("s", "Save"),
            ("?", "Help"),
        ],
        Section::Keywords => vec![
            ("↑↓", "Nav"),
            ("a", "Add"),
            ("e", "Edit"),
            ("d", "Del"),
            ("s", "Save"),
            ("?", "Help"),
        ],
        Section::Languages => vec![
            ("↑↓", "Nav"),
            ("Space", "Toggle"),
            ("Tab", "Next"),
            ("s", "Save"),
            ("?", "Help"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_dialog_popup(f: &mut Frame, _app: &App, dialog: &Dialog) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 90 } else { 55 }, 45, area);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", dialog.title),
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(3),    // content
            Constraint::Length(1), // validation message
            Constraint::Length(1), // buttons
            Constraint::Length(1), // hint
        ])
        .split(popup_area);

    draw_dialog_content(f, dialog, inner[0]);

    if let Some(ref error) = dialog.error {
        let line = Paragraph::new(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(danger()),
        )))
        .alignment(Alignment::Center);
        f.render_widget(line, inner[1]);
    }

    let button_spans: Vec<Span> = dialog
        .buttons
        .iter()
        .enumerate()
        .flat_map(|(i, button)| {
            let mut style = if button.primary {
                Style::default().fg(accent()).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(text_dim())
            };
            if i == dialog.focused {
                style = style.bg(bg_selected());
            }
            vec![
                Span::styled(format!("[ {} ]", button.label), style),
                Span::raw("  "),
            ]
        })
        .collect();
    let buttons = Paragraph::new(Line::from(button_spans)).alignment(Alignment::Center);
    f.render_widget(buttons, inner[2]);

    let hint_text = if dialog.frame_hint.is_empty() {
        "←→ buttons · Enter confirm · Esc close".to_string()
    } else {
        dialog.frame_hint.lines().next().unwrap_or_default().to_string()
    };
    let hint = Paragraph::new(Line::from(Span::styled(
        hint_text,
        Style::default().fg(text_dim()),
    )))
    .alignment(Alignment::Center);
    f.render_widget(hint, inner[3]);
}

fn draw_dialog_content(f: &mut Frame, dialog: &Dialog, area: Rect) {
    match &dialog.content {
        DialogContent::Markup(markup) => {
            let body = Paragraph::new(markup.as_str())
                .style(Style::default().fg(text()))
                .wrap(Wrap { trim: false });
            f.render_widget(body, area);
        }
        DialogContent::TextInput(input) => {
            let prompt = if input.prompt.is_empty() {
                format!("{}:", input.label)
            } else {
                input.prompt.lines().next().unwrap_or_default().to_string()
            };
            let lines = vec![
                Line::from(Span::styled(prompt, Style::default().fg(text_dim()))),
                Line::from(vec![
                    Span::styled("> ", Style::default().fg(accent())),
                    Span::styled(
                        format!("{}_", input.value),
                        Style::default().fg(text()),
                    ),
                ]),
            ];
            f.render_widget(Paragraph::new(lines), area);
        }
        DialogContent::SelectInput(input) => {
            let prompt = if input.prompt.is_empty() {
                format!("{}:", input.label)
            } else {
                input.prompt.lines().next().unwrap_or_default().to_string()
            };
            let mut lines = vec![Line::from(Span::styled(
                prompt,
                Style::default().fg(text_dim()),
            ))];
            for (i, (key, label)) in input.select.options().iter().enumerate() {
                let style = if input.select.selected_index() == Some(i) {
                    Style::default().fg(text()).bg(bg_selected())
                } else {
                    Style::default().fg(text())
                };
                lines.push(Line::from(vec![
                    Span::styled(format!(" {} ", label), style),
                    Span::styled(format!("({})", key), Style::default().fg(text_dim())),
                ]));
            }
            f.render_widget(Paragraph::new(lines), area);
        }
        DialogContent::PairInput {
            key_input,
            value_input,
            focus_value,
        } => {
            let lines = vec![
                input_line(
                    &key_input.label,
                    &key_input.value,
                    !*focus_value,
                    text(),
                    accent(),
                ),
                input_line(
                    &value_input.label,
                    &value_input.value,
                    *focus_value,
                    text(),
                    accent(),
                ),
                Line::from(Span::styled(
                    "Tab switches fields",
                    Style::default().fg(text_dim()),
                )),
            ];
            f.render_widget(Paragraph::new(lines), area);
        }
    }
}

fn draw_alert_popup(f: &mut Frame, alert: &Alert) {
    let popup_area = centered_rect(45, 25, f.area());
    f.render_widget(Clear, popup_area);

    let color = match alert.kind {
        AlertKind::Success => success(),
        AlertKind::Info => header(),
        AlertKind::Warning => warning(),
        AlertKind::Error => danger(),
    };

    let body = if alert.body.is_empty() {
        alert.title.clone()
    } else {
        alert.body.clone()
    };

    let mut lines: Vec<Line> = vec![Line::from("")];
    for text_line in body.lines() {
        lines.push(Line::from(Span::styled(
            text_line.to_string(),
            Style::default().fg(text()),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc close",
        Style::default().fg(text_dim()),
    )));

    let popup = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", alert.title),
                    Style::default().fg(color),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    f.render_widget(popup, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 95 } else { 60 }, 70, area);

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "═══ Navigation ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Tab       ", Style::default().fg(accent())),
            Span::raw("Switch sections (Details → Author → Keywords → Languages)"),
        ]),
        Line::from(vec![
            Span::styled("  ↑/↓ j/k   ", Style::default().fg(accent())),
            Span::raw("Move up/down in the active section"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Editing ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Enter/e   ", Style::default().fg(accent())),
            Span::raw("Edit the selected field or entry"),
        ]),
        Line::from(vec![
            Span::styled("  a         ", Style::default().fg(accent())),
            Span::raw("Add an author entry or keyword"),
        ]),
        Line::from(vec![
            Span::styled("  d         ", Style::default().fg(accent())),
            Span::raw("Delete the selected entry"),
        ]),
        Line::from(vec![
            Span::styled("  Space     ", Style::default().fg(accent())),
            Span::raw("Toggle the selected translation language"),
        ]),
        Line::from(vec![
            Span::styled("  s         ", Style::default().fg(accent())),
            Span::raw("Save the document"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Dialogs ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  ←/→       ", Style::default().fg(accent())),
            Span::raw("Move between buttons"),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", Style::default().fg(accent())),
            Span::raw("Click the focused button"),
        ]),
        Line::from(vec![
            Span::styled("  Esc       ", Style::default().fg(accent())),
            Span::raw("Close without applying"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" archet Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}
