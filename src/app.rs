use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use crate::archetype::{self, ArchetypeMeta};
use crate::config::AppConfig;
use crate::dialog::{
    self, Alert, AlertKind, AlertOptions, Dialog, DialogContent, DialogOptions, SelectOptions,
    TextInput,
};
use crate::forms::{CheckItem, DropDownCheckboxList, StringList, StringListOptions, TableMap};
use crate::id::IdGen;
use crate::template::TemplateService;

/// Template documents preloaded at startup.
pub const TEMPLATE_DOCUMENTS: [&str; 2] = ["dialog-common", "util"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Details,
    Author,
    Keywords,
    Languages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    ArchetypeId,
    Concept,
    Purpose,
    OriginalLanguage,
}

pub const DETAIL_FIELDS: [DetailField; 4] = [
    DetailField::ArchetypeId,
    DetailField::Concept,
    DetailField::Purpose,
    DetailField::OriginalLanguage,
];

impl DetailField {
    pub fn label(&self) -> &'static str {
        match self {
            DetailField::ArchetypeId => "Archetype id",
            DetailField::Concept => "Concept",
            DetailField::Purpose => "Purpose",
            DetailField::OriginalLanguage => "Original language",
        }
    }
}

/// Popup drawn over the sections. A dialog that closes is dropped here,
/// never kept around.
pub enum Overlay {
    Dialog(Dialog),
    Alert(Alert),
    Help,
}

/// Which part of the document a confirmed dialog feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DialogRoute {
    #[default]
    None,
    EditDetail(DetailField),
    AuthorAdd,
    AuthorEdit {
        row_id: u32,
    },
    KeywordAdd,
    KeywordEdit,
}

pub struct App {
    pub section: Section,
    pub overlay: Option<Overlay>,
    route: DialogRoute,

    pub file: PathBuf,
    pub meta: ArchetypeMeta,

    // Widgets (each owns its editable state)
    pub author: TableMap,
    pub keywords: StringList,
    pub languages: DropDownCheckboxList,
    pub details_cursor: usize,

    pub config: AppConfig,
    pub templates: TemplateService,
    pub ids: IdGen,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // Shared with the widget handlers
    dirty: Rc<Cell<bool>>,
}

impl App {
    pub async fn new(
        config: AppConfig,
        file: PathBuf,
        mut meta: ArchetypeMeta,
        templates: TemplateService,
    ) -> Self {
        templates.preload(&TEMPLATE_DOCUMENTS.map(String::from)).await;

        if meta.languages.is_empty() {
            meta.languages = archetype::default_languages();
        }

        let ids = IdGen::new();
        let mut author = TableMap::new(&ids, &meta.original_author);
        let mut keywords = StringList::new(
            &ids,
            &meta.keywords,
            StringListOptions {
                size: config.list_rows,
                item: "keyword".to_string(),
            },
        );
        let items: Vec<CheckItem> = meta
            .languages
            .iter()
            .map(|l| CheckItem {
                code: l.code.clone(),
                label: l.label.clone(),
                checked: l.checked,
            })
            .collect();
        let mut languages = DropDownCheckboxList::new(&ids, "Translations", items);

        let dirty = Rc::new(Cell::new(false));
        let d = dirty.clone();
        author.on_blur(move |_| d.set(true));
        let d = dirty.clone();
        keywords.on_change(move |_| d.set(true));
        let d = dirty.clone();
        languages.on_change(move |_| d.set(true));

        Self {
            section: Section::Details,
            overlay: None,
            route: DialogRoute::None,
            file,
            meta,
            author,
            keywords,
            languages,
            details_cursor: 0,
            config,
            templates,
            ids,
            status_message: None,
            status_message_time: None,
            dirty,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn detail_value(&self, field: DetailField) -> &str {
        match field {
            DetailField::ArchetypeId => &self.meta.archetype_id,
            DetailField::Concept => &self.meta.concept,
            DetailField::Purpose => &self.meta.purpose,
            DetailField::OriginalLanguage => &self.meta.original_language,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return Ok(());
        }
        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            // Navigation between sections
            KeyCode::Tab => {
                let next = match self.section {
                    Section::Details => Section::Author,
                    Section::Author => Section::Keywords,
                    Section::Keywords => Section::Languages,
                    Section::Languages => Section::Details,
                };
                self.enter_section(next);
            }
            KeyCode::BackTab => {
                let prev = match self.section {
                    Section::Details => Section::Languages,
                    Section::Author => Section::Details,
                    Section::Keywords => Section::Author,
                    Section::Languages => Section::Keywords,
                };
                self.enter_section(prev);
            }

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            KeyCode::Char('a') => match self.section {
                Section::Author => self.open_author_add().await,
                Section::Keywords => self.open_keyword_add().await,
                _ => {}
            },

            KeyCode::Char('e') => self.open_editor_for_selection().await,

            KeyCode::Enter | KeyCode::Char(' ') => match self.section {
                Section::Languages => self.languages.toggle_cursor(),
                _ => self.open_editor_for_selection().await,
            },

            KeyCode::Char('d') | KeyCode::Delete => self.delete_selection(),

            KeyCode::Char('s') => self.save().await,

            KeyCode::Char('?') | KeyCode::Char('h') => self.overlay = Some(Overlay::Help),

            _ => {}
        }
        Ok(())
    }

    /// Switches the active section; the language dropdown opens while
    /// its section is active and closes when focus leaves it.
    fn enter_section(&mut self, section: Section) {
        if self.section == Section::Languages && section != Section::Languages {
            self.languages.close();
        }
        self.section = section;
        if section == Section::Languages {
            self.languages.open();
        }
    }

    fn move_down(&mut self) {
        match self.section {
            Section::Details => {
                self.details_cursor = (self.details_cursor + 1) % DETAIL_FIELDS.len();
            }
            Section::Author => self.author.select_next(),
            Section::Keywords => self.keywords.select_next(),
            Section::Languages => self.languages.cursor_next(),
        }
    }

    fn move_up(&mut self) {
        match self.section {
            Section::Details => {
                self.details_cursor = self
                    .details_cursor
                    .checked_sub(1)
                    .unwrap_or(DETAIL_FIELDS.len() - 1);
            }
            Section::Author => self.author.select_prev(),
            Section::Keywords => self.keywords.select_prev(),
            Section::Languages => self.languages.cursor_prev(),
        }
    }

    async fn open_editor_for_selection(&mut self) {
        match self.section {
            Section::Details => self.open_detail_editor().await,
            Section::Author => self.open_author_edit().await,
            Section::Keywords => self.open_keyword_edit().await,
            Section::Languages => self.languages.toggle_cursor(),
        }
    }

    async fn open_detail_editor(&mut self) {
        let field = DETAIL_FIELDS[self.details_cursor];
        match field {
            DetailField::OriginalLanguage => {
                let choices = archetype::language_choices(&self.meta.languages);
                let selected = self.meta.original_language.clone();
                let options = DialogOptions::default()
                    .with_title("Original language")
                    .with_buttons(vec![("cancel", "Cancel"), ("ok", "Ok")]);
                let dialog = dialog::open_single_select_input_dialog(
                    &self.templates,
                    &self.ids,
                    options,
                    &SelectOptions::Ordered(choices),
                    Some(&selected),
                    Box::new(|_key| {}),
                )
                .await;
                self.route = DialogRoute::EditDetail(field);
                self.overlay = Some(Overlay::Dialog(dialog));
            }
            _ => {
                let mut options = DialogOptions::default()
                    .with_title(format!("Edit {}", field.label().to_lowercase()))
                    .with_buttons(vec![("cancel", "Cancel"), ("ok", "Ok")]);
                if field == DetailField::ArchetypeId {
                    options = options.with_callback(|content, button| {
                        if button == "ok" {
                            if let DialogContent::TextInput(input) = content {
                                if input.value.trim().is_empty() {
                                    return Some("Archetype id must not be empty".to_string());
                                }
                            }
                        }
                        None
                    });
                }
                let value = self.detail_value(field).to_string();
                let dialog = dialog::open_single_text_input_dialog(
                    &self.templates,
                    &self.ids,
                    options,
                    Some(field.label()),
                    &value,
                )
                .await;
                self.route = DialogRoute::EditDetail(field);
                self.overlay = Some(Overlay::Dialog(dialog));
            }
        }
    }

    async fn open_keyword_add(&mut self) {
        let existing = self.keywords.get_as_list();
        let noun = self.keywords.item_noun().to_string();
        let options = DialogOptions::default()
            .with_title(format!("Add {}", noun))
            .with_buttons(vec![("cancel", "Cancel"), ("ok", "Ok")])
            .with_callback(move |content, button| {
                if button != "ok" {
                    return None;
                }
                if let DialogContent::TextInput(input) = content {
                    let trimmed = input.value.trim();
                    if !trimmed.is_empty() && existing.iter().any(|k| k == trimmed) {
                        return Some(format!("\"{}\" is already in the list", trimmed));
                    }
                }
                None
            });
        let dialog = dialog::open_single_text_input_dialog(
            &self.templates,
            &self.ids,
            options,
            Some(&noun),
            "",
        )
        .await;
        self.route = DialogRoute::KeywordAdd;
        self.overlay = Some(Overlay::Dialog(dialog));
    }

    async fn open_keyword_edit(&mut self) {
        let Some(value) = self.keywords.selected_value().map(str::to_string) else {
            return;
        };
        let noun = self.keywords.item_noun().to_string();
        let options = DialogOptions::default()
            .with_title(format!("Edit {}", noun))
            .with_buttons(vec![("cancel", "Cancel"), ("ok", "Ok")]);
        let dialog = dialog::open_single_text_input_dialog(
            &self.templates,
            &self.ids,
            options,
            Some(&noun),
            &value,
        )
        .await;
        self.route = DialogRoute::KeywordEdit;
        self.overlay = Some(Overlay::Dialog(dialog));
    }

    async fn open_author_add(&mut self) {
        let content = DialogContent::PairInput {
            key_input: TextInput {
                id: self.ids.next_id(),
                label: "Key".to_string(),
                ..Default::default()
            },
            value_input: TextInput {
                id: self.ids.next_id(),
                label: "Value".to_string(),
                ..Default::default()
            },
            focus_value: false,
        };
        let options = DialogOptions::default()
            .with_title("Add author detail")
            .with_buttons(vec![("cancel", "Cancel"), ("ok", "Ok")]);
        let dialog = dialog::open_simple_dialog(&self.templates, &self.ids, options, content).await;
        self.route = DialogRoute::AuthorAdd;
        self.overlay = Some(Overlay::Dialog(dialog));
    }

    async fn open_author_edit(&mut self) {
        let Some(row) = self.author.selected_row() else {
            return;
        };
        let (row_id, key, value) = (row.row_id, row.key.clone(), row.value.clone());
        let content = DialogContent::PairInput {
            key_input: TextInput {
                id: self.ids.next_id(),
                label: "Key".to_string(),
                value: key,
                ..Default::default()
            },
            value_input: TextInput {
                id: self.ids.next_id(),
                label: "Value".to_string(),
                value,
                ..Default::default()
            },
            focus_value: true,
        };
        let options = DialogOptions::default()
            .with_title("Edit author detail")
            .with_buttons(vec![("cancel", "Cancel"), ("ok", "Ok")]);
        let dialog = dialog::open_simple_dialog(&self.templates, &self.ids, options, content).await;
        self.route = DialogRoute::AuthorEdit { row_id };
        self.overlay = Some(Overlay::Dialog(dialog));
    }

    fn delete_selection(&mut self) {
        match self.section {
            Section::Author => {
                if let Some(row) = self.author.selected_row() {
                    let row_id = row.row_id;
                    self.author.remove_row(row_id);
                    self.set_status("Entry removed");
                }
            }
            Section::Keywords => {
                if self.keywords.selected_value().is_some() {
                    self.keywords.remove_selected();
                    self.set_status("Keyword removed");
                }
            }
            _ => {}
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) {
        match self.overlay.take() {
            Some(Overlay::Help) => {
                if !matches!(
                    key.code,
                    KeyCode::Esc
                        | KeyCode::Enter
                        | KeyCode::Char('q')
                        | KeyCode::Char('?')
                        | KeyCode::Char('h')
                ) {
                    self.overlay = Some(Overlay::Help);
                }
            }
            Some(Overlay::Alert(alert)) => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                    self.overlay = Some(Overlay::Alert(alert));
                }
            }
            Some(Overlay::Dialog(mut dialog)) => {
                let mut closed = false;
                match key.code {
                    KeyCode::Esc => {
                        dialog.dismiss();
                        closed = true;
                        self.route = DialogRoute::None;
                    }
                    KeyCode::Enter => {
                        if let Some(name) = dialog.focused_button().map(|b| b.name.clone()) {
                            if dialog.click(&name) {
                                closed = true;
                                let route = std::mem::take(&mut self.route);
                                if name == "ok" {
                                    self.apply_dialog(route, &dialog.content);
                                }
                            }
                        }
                    }
                    KeyCode::Left => dialog.focus_prev(),
                    KeyCode::Right => dialog.focus_next(),
                    KeyCode::Tab | KeyCode::BackTab => {
                        if let DialogContent::PairInput { focus_value, .. } = &mut dialog.content {
                            *focus_value = !*focus_value;
                        }
                    }
                    KeyCode::Up => {
                        if let DialogContent::SelectInput(input) = &mut dialog.content {
                            input.select.select_prev();
                        }
                    }
                    KeyCode::Down => {
                        if let DialogContent::SelectInput(input) = &mut dialog.content {
                            input.select.select_next();
                        }
                    }
                    KeyCode::Backspace => match &mut dialog.content {
                        DialogContent::TextInput(input) => {
                            input.value.pop();
                        }
                        DialogContent::PairInput {
                            key_input,
                            value_input,
                            focus_value,
                        } => {
                            if *focus_value {
                                value_input.value.pop();
                            } else {
                                key_input.value.pop();
                            }
                        }
                        _ => {}
                    },
                    KeyCode::Char(c) => match &mut dialog.content {
                        DialogContent::TextInput(input) => input.value.push(c),
                        DialogContent::PairInput {
                            key_input,
                            value_input,
                            focus_value,
                        } => {
                            if *focus_value {
                                value_input.value.push(c);
                            } else {
                                key_input.value.push(c);
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
                if !closed {
                    self.overlay = Some(Overlay::Dialog(dialog));
                }
            }
            None => {}
        }
    }

    /// Feeds a confirmed dialog's content to whatever opened it.
    fn apply_dialog(&mut self, route: DialogRoute, content: &DialogContent) {
        match route {
            DialogRoute::None => {}
            DialogRoute::EditDetail(field) => {
                let value = match content {
                    DialogContent::TextInput(input) => Some(input.value.trim().to_string()),
                    DialogContent::SelectInput(input) => {
                        input.select.value().map(|v| v.to_string())
                    }
                    _ => None,
                };
                if let Some(value) = value {
                    match field {
                        DetailField::ArchetypeId => self.meta.archetype_id = value,
                        DetailField::Concept => self.meta.concept = value,
                        DetailField::Purpose => self.meta.purpose = value,
                        DetailField::OriginalLanguage => self.meta.original_language = value,
                    }
                    self.dirty.set(true);
                }
            }
            DialogRoute::KeywordAdd => {
                if let DialogContent::TextInput(input) = content {
                    self.keywords.add(&input.value);
                }
            }
            DialogRoute::KeywordEdit => {
                if let DialogContent::TextInput(input) = content {
                    self.keywords.edit_selected(&input.value);
                }
            }
            DialogRoute::AuthorAdd => {
                if let DialogContent::PairInput {
                    key_input,
                    value_input,
                    ..
                } = content
                {
                    self.author
                        .add_row(key_input.value.trim(), value_input.value.trim());
                    // the inputs just lost focus
                    self.author.notify_blur();
                }
            }
            DialogRoute::AuthorEdit { row_id } => {
                if let DialogContent::PairInput {
                    key_input,
                    value_input,
                    ..
                } = content
                {
                    self.author
                        .set_row(row_id, key_input.value.trim(), value_input.value.trim());
                }
            }
        }
    }

    /// Writes widget state back into the document and saves it.
    pub async fn save(&mut self) {
        self.meta.original_author = self.author.get_as_map();
        self.meta.keywords = self.keywords.get_as_list();
        let selected = self.languages.get_item_selection_list();
        for (language, checked) in self.meta.languages.iter_mut().zip(selected) {
            language.checked = checked;
        }

        match self.meta.save(&self.file) {
            Ok(()) => {
                self.dirty.set(false);
                self.set_status(format!("Saved {}", self.file.display()));
            }
            Err(e) => {
                let message = format!("{:#}", e);
                crate::notice::toast_error(&message, self.config.notifications);
                let alert = dialog::alert(
                    &self.templates,
                    &self.ids,
                    AlertOptions {
                        kind: AlertKind::Error,
                        title: "Save failed".to_string(),
                        text: message,
                    },
                )
                .await;
                self.overlay = Some(Overlay::Alert(alert));
            }
        }
    }

    pub fn tick(&mut self) {
        // Clear status message after 3 seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FetchError, TemplateFetcher};
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;

    struct NoFetcher;

    #[async_trait]
    impl TemplateFetcher for NoFetcher {
        async fn fetch(&self, _path: &str) -> Result<String, FetchError> {
            Err(FetchError { status: 404, body: None })
        }
    }

    async fn app() -> App {
        App::new(
            AppConfig::default(),
            PathBuf::from("/tmp/archet-test.json"),
            ArchetypeMeta::default(),
            TemplateService::new(NoFetcher),
        )
        .await
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn keyword_add_flows_through_the_dialog() {
        let mut app = app().await;
        app.enter_section(Section::Keywords);

        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        assert!(matches!(app.overlay, Some(Overlay::Dialog(_))));

        type_text(&mut app, "pressure").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        assert!(app.overlay.is_none());
        assert_eq!(app.keywords.get_as_list(), vec!["pressure"]);
        assert!(app.is_dirty());
    }

    #[tokio::test]
    async fn duplicate_keyword_keeps_the_dialog_open() {
        let mut app = app().await;
        app.keywords.add("pressure");
        app.enter_section(Section::Keywords);

        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_text(&mut app, "pressure").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        match &app.overlay {
            Some(Overlay::Dialog(dialog)) => {
                assert!(dialog.is_open());
                assert!(dialog.error.is_some());
            }
            _ => panic!("dialog should still be open"),
        }
        // nothing was added
        assert_eq!(app.keywords.get_as_list(), vec!["pressure"]);
    }

    #[tokio::test]
    async fn esc_dismisses_the_dialog() {
        let mut app = app().await;
        app.enter_section(Section::Keywords);
        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();

        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert!(app.overlay.is_none());
        assert!(app.keywords.get_as_list().is_empty());
    }

    #[tokio::test]
    async fn author_add_dialog_fills_the_table() {
        let mut app = app().await;
        app.enter_section(Section::Author);

        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_text(&mut app, "name").await;
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        type_text(&mut app, "A. Person").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        let map = app.author.get_as_map();
        assert_eq!(map.get("name").map(String::as_str), Some("A. Person"));
        assert!(app.is_dirty());
    }

    #[tokio::test]
    async fn language_toggle_marks_dirty() {
        let mut app = app().await;
        app.enter_section(Section::Languages);
        assert!(app.languages.is_open());

        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
        assert!(app.languages.is_open());
        assert!(app.is_dirty());
        assert!(app.languages.get_item_selection_list()[0]);
    }

    #[tokio::test]
    async fn empty_archetype_id_is_rejected_inline() {
        let mut app = app().await;
        // Details section, cursor on archetype id
        app.handle_key(key(KeyCode::Char('e'))).await.unwrap();
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        match &app.overlay {
            Some(Overlay::Dialog(dialog)) => {
                assert_eq!(
                    dialog.error.as_deref(),
                    Some("Archetype id must not be empty")
                );
            }
            _ => panic!("dialog should still be open"),
        }

        type_text(&mut app, "openEHR-EHR-OBSERVATION.test.v1").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert!(app.overlay.is_none());
        assert_eq!(app.meta.archetype_id, "openEHR-EHR-OBSERVATION.test.v1");
    }
}
