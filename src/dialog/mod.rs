//! Modal dialog model
//!
//! A dialog is an explicit state object the UI layer paints as a centered
//! popup. The generic frame carries a title, arbitrary content, an ordered
//! button row (the last button is the primary action) and an inline
//! validation line. A button click runs the dialog callback; a returned
//! string is displayed as the validation message and keeps the dialog
//! open, anything else closes it. Once closed, the owner drops the dialog.

use std::collections::HashMap;

use serde_json::json;

use crate::id::IdGen;
use crate::template::{TemplateService, TemplateSink};

/// Receives the dialog content and the clicked button name. `Some(msg)`
/// keeps the dialog open with `msg` shown inline; `None` closes it.
pub type DialogCallback = Box<dyn FnMut(&DialogContent, &str) -> Option<String>>;

/// Configuration for a dialog. Buttons are `(action name, label)` pairs;
/// their order is the footer order and the last one becomes the primary
/// action.
pub struct DialogOptions {
    pub title: String,
    pub buttons: Vec<(String, String)>,
    pub callback: Option<DialogCallback>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            title: "Dialog".to_string(),
            buttons: vec![("ok".to_string(), "Ok".to_string())],
            callback: None,
        }
    }
}

impl DialogOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<(&str, &str)>) -> Self {
        self.buttons = buttons
            .into_iter()
            .map(|(n, l)| (n.to_string(), l.to_string()))
            .collect();
        self
    }

    pub fn with_callback(
        mut self,
        callback: impl FnMut(&DialogContent, &str) -> Option<String> + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Clone)]
pub struct DialogButton {
    pub name: String,
    pub label: String,
    pub primary: bool,
}

/// A single text field inside a dialog.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub id: String,
    pub label: String,
    pub value: String,
    /// Prompt fragment rendered from the singleTextInput template.
    pub prompt: String,
}

/// A select field inside a dialog.
#[derive(Debug, Clone, Default)]
pub struct SelectInput {
    pub id: String,
    pub label: String,
    pub select: Select,
    pub prompt: String,
}

pub enum DialogContent {
    /// Pre-rendered text block.
    Markup(String),
    TextInput(TextInput),
    SelectInput(SelectInput),
    /// Two text fields edited together (key/value row editors).
    PairInput {
        key_input: TextInput,
        value_input: TextInput,
        focus_value: bool,
    },
}

pub struct Dialog {
    pub panel_id: String,
    pub title: String,
    pub buttons: Vec<DialogButton>,
    pub content: DialogContent,
    /// Inline validation message; cleared on the next successful click.
    pub error: Option<String>,
    /// Index of the keyboard-focused button.
    pub focused: usize,
    /// Hint line rendered from the frame template.
    pub frame_hint: String,
    open: bool,
    callback: Option<DialogCallback>,
}

impl Dialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn focused_button(&self) -> Option<&DialogButton> {
        self.buttons.get(self.focused)
    }

    pub fn focus_next(&mut self) {
        if !self.buttons.is_empty() {
            self.focused = (self.focused + 1) % self.buttons.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.buttons.is_empty() {
            self.focused = self
                .focused
                .checked_sub(1)
                .unwrap_or(self.buttons.len() - 1);
        }
    }

    /// Clicks the named button. Returns true when the dialog closed.
    pub fn click(&mut self, button: &str) -> bool {
        if let Some(mut callback) = self.callback.take() {
            let verdict = callback(&self.content, button);
            self.callback = Some(callback);
            if let Some(message) = verdict {
                self.error = Some(message);
                return false;
            }
        }
        self.error = None;
        self.open = false;
        true
    }

    /// Closes without running the callback (close icon, Esc).
    pub fn dismiss(&mut self) {
        self.open = false;
    }
}

/// Builds the open-dialog state: merges the supplied options over the
/// defaults, marks the last button primary, and renders the frame
/// fragment. The primary button starts focused.
pub async fn open_simple_dialog(
    service: &TemplateService,
    ids: &IdGen,
    options: DialogOptions,
    content: DialogContent,
) -> Dialog {
    let mut buttons: Vec<DialogButton> = options
        .buttons
        .iter()
        .map(|(name, label)| DialogButton {
            name: name.clone(),
            label: label.clone(),
            primary: false,
        })
        .collect();
    if let Some(last) = buttons.last_mut() {
        last.primary = true;
    }

    let frame_context = json!({
        "title": options.title,
        "buttons": buttons
            .iter()
            .map(|b| json!({ "name": b.name, "label": b.label, "primary": b.primary }))
            .collect::<Vec<_>>(),
    });
    let mut frame_hint = String::new();
    let _ = service
        .apply(
            "dialog-common|frame",
            &frame_context,
            TemplateSink::Append(&mut frame_hint),
        )
        .await;

    let focused = buttons.len().saturating_sub(1);
    Dialog {
        panel_id: ids.next_id(),
        title: options.title,
        buttons,
        content,
        error: None,
        focused,
        frame_hint,
        open: true,
        callback: options.callback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Info => "info",
            AlertKind::Warning => "warning",
            AlertKind::Error => "error",
        }
    }
}

pub struct AlertOptions {
    pub kind: AlertKind,
    pub title: String,
    pub text: String,
}

/// A rendered alert popup, displayed until dismissed.
pub struct Alert {
    pub panel_id: String,
    pub kind: AlertKind,
    pub title: String,
    pub body: String,
}

pub async fn alert(service: &TemplateService, ids: &IdGen, options: AlertOptions) -> Alert {
    let panel_id = ids.next_id();
    let context = json!({
        "panel_id": panel_id,
        "type": options.kind.as_str(),
        "title": options.title,
        "text": options.text,
    });
    let mut body = String::new();
    let _ = service
        .apply(
            "dialog-common|alert",
            &context,
            TemplateSink::Append(&mut body),
        )
        .await;
    Alert {
        panel_id,
        kind: options.kind,
        title: options.title,
        body,
    }
}

/// Opens a dialog whose content is a single labeled text field. The
/// label falls back to the dialog title.
pub async fn open_single_text_input_dialog(
    service: &TemplateService,
    ids: &IdGen,
    options: DialogOptions,
    input_label: Option<&str>,
    input_value: &str,
) -> Dialog {
    let id = ids.next_id();
    let label = input_label.unwrap_or(&options.title).to_string();
    let context = json!({ "id": id, "label": label, "value": input_value });
    let mut prompt = String::new();
    let _ = service
        .apply(
            "dialog-common|singleTextInput",
            &context,
            TemplateSink::Append(&mut prompt),
        )
        .await;

    let content = DialogContent::TextInput(TextInput {
        id,
        label,
        value: input_value.to_string(),
        prompt,
    });
    open_simple_dialog(service, ids, options, content).await
}

/// Opens a dialog whose content is a single select field. The caller's
/// `on_select` is wrapped so it receives the selected option's key when
/// a button is clicked.
pub async fn open_single_select_input_dialog(
    service: &TemplateService,
    ids: &IdGen,
    mut options: DialogOptions,
    select_options: &SelectOptions,
    selected_key: Option<&str>,
    mut on_select: Box<dyn FnMut(&str)>,
) -> Dialog {
    let id = ids.next_id();
    let label = options.title.clone();
    let context = json!({ "id": id, "label": label });
    let mut prompt = String::new();
    let _ = service
        .apply(
            "dialog-common|singleSelectInput",
            &context,
            TemplateSink::Append(&mut prompt),
        )
        .await;

    let mut select = Select::default();
    populate_select(&mut select, select_options, selected_key);

    options.callback = Some(Box::new(move |content, _button| {
        if let DialogContent::SelectInput(input) = content {
            if let Some(value) = input.select.value() {
                on_select(value);
            }
        }
        None
    }));

    let content = DialogContent::SelectInput(SelectInput {
        id,
        label,
        select,
        prompt,
    });
    open_simple_dialog(service, ids, options, content).await
}

/// A select element: ordered `(key, label)` options plus a selection.
#[derive(Debug, Clone, Default)]
pub struct Select {
    options: Vec<(String, String)>,
    selected: Option<usize>,
}

impl Select {
    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    /// Appends an option; the first appended option becomes selected.
    pub fn append(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.options.push((key.into(), label.into()));
        if self.selected.is_none() {
            self.selected = Some(0);
        }
    }

    /// Key of the selected option.
    pub fn value(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|(k, _)| k.as_str())
    }

    /// Selects the option with the given key, if present.
    pub fn select_key(&mut self, key: &str) -> bool {
        match self.options.iter().position(|(k, _)| k == key) {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            if i + 1 < self.options.len() {
                self.selected = Some(i + 1);
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }
}

/// Select population input: an ordered list of `(key, label)` pairs, or
/// an unordered mapping whose iteration order is unspecified — callers
/// that care about order use `Ordered`.
pub enum SelectOptions {
    Ordered(Vec<(String, String)>),
    Keyed(HashMap<String, String>),
}

/// Clears and repopulates a select. The first appended entry becomes
/// selected; `selected_key` overrides the selection afterwards.
pub fn populate_select(select: &mut Select, options: &SelectOptions, selected_key: Option<&str>) {
    select.clear();
    match options {
        SelectOptions::Ordered(pairs) => {
            for (key, label) in pairs {
                select.append(key.clone(), label.clone());
            }
        }
        SelectOptions::Keyed(map) => {
            for (key, label) in map {
                select.append(key.clone(), label.clone());
            }
        }
    }
    if let Some(key) = selected_key {
        select.select_key(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FetchError, TemplateFetcher, TemplateService};
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NoFetcher;

    #[async_trait]
    impl TemplateFetcher for NoFetcher {
        async fn fetch(&self, _path: &str) -> Result<String, FetchError> {
            Err(FetchError { status: 404, body: None })
        }
    }

    fn service() -> TemplateService {
        TemplateService::new(NoFetcher)
    }

    #[tokio::test]
    async fn defaults_apply_and_last_button_is_primary() {
        let ids = IdGen::new();
        let dialog = open_simple_dialog(
            &service(),
            &ids,
            DialogOptions::default(),
            DialogContent::Markup(String::new()),
        )
        .await;

        assert_eq!(dialog.title, "Dialog");
        assert!(dialog.panel_id.starts_with("gid_"));
        assert_eq!(dialog.buttons.len(), 1);
        assert_eq!(dialog.buttons[0].name, "ok");
        assert_eq!(dialog.buttons[0].label, "Ok");
        assert!(dialog.buttons[0].primary);
    }

    #[tokio::test]
    async fn button_order_is_preserved_and_only_last_is_primary() {
        let ids = IdGen::new();
        let options = DialogOptions::default()
            .with_buttons(vec![("cancel", "Cancel"), ("apply", "Apply"), ("ok", "Ok")]);
        let dialog =
            open_simple_dialog(&service(), &ids, options, DialogContent::Markup(String::new()))
                .await;

        let names: Vec<&str> = dialog.buttons.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["cancel", "apply", "ok"]);
        let primaries: Vec<bool> = dialog.buttons.iter().map(|b| b.primary).collect();
        assert_eq!(primaries, vec![false, false, true]);
        // primary starts focused
        assert_eq!(dialog.focused_button().unwrap().name, "ok");
    }

    #[tokio::test]
    async fn validation_string_keeps_the_dialog_open() {
        let ids = IdGen::new();
        let options = DialogOptions::default().with_callback(|content, button| {
            assert_eq!(button, "ok");
            if let DialogContent::TextInput(input) = content {
                if input.value.trim().is_empty() {
                    return Some("bad value".to_string());
                }
            }
            None
        });
        let mut dialog =
            open_single_text_input_dialog(&service(), &ids, options, Some("Name"), "").await;

        if let DialogContent::TextInput(input) = &dialog.content {
            assert!(input.id.starts_with("gid_"));
            assert_eq!(input.label, "Name");
        } else {
            panic!("expected a text input");
        }

        assert!(!dialog.click("ok"));
        assert!(dialog.is_open());
        assert_eq!(dialog.error.as_deref(), Some("bad value"));

        if let DialogContent::TextInput(input) = &mut dialog.content {
            input.value = "filled".to_string();
        }
        assert!(dialog.click("ok"));
        assert!(!dialog.is_open());
        assert_eq!(dialog.error, None);
    }

    #[tokio::test]
    async fn click_without_callback_closes() {
        let ids = IdGen::new();
        let mut dialog = open_simple_dialog(
            &service(),
            &ids,
            DialogOptions::default(),
            DialogContent::Markup("hello".to_string()),
        )
        .await;

        assert!(dialog.click("ok"));
        assert!(!dialog.is_open());
    }

    #[tokio::test]
    async fn select_dialog_passes_the_selected_key() {
        let ids = IdGen::new();
        let picked: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
        let sink = picked.clone();

        let mut dialog = open_single_select_input_dialog(
            &service(),
            &ids,
            DialogOptions::default().with_title("Language"),
            &SelectOptions::Ordered(vec![
                ("en".to_string(), "English".to_string()),
                ("de".to_string(), "German".to_string()),
            ]),
            Some("de"),
            Box::new(move |key| {
                *sink.borrow_mut() = Some(key.to_string());
            }),
        )
        .await;

        if let DialogContent::SelectInput(input) = &dialog.content {
            assert!(input.id.starts_with("gid_"));
        } else {
            panic!("expected a select input");
        }

        assert!(dialog.click("ok"));
        assert_eq!(picked.borrow().as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn alert_carries_a_generated_panel_id() {
        let ids = IdGen::new();
        let popup = alert(
            &service(),
            &ids,
            AlertOptions {
                kind: AlertKind::Error,
                title: "Save failed".to_string(),
                text: "disk full".to_string(),
            },
        )
        .await;

        assert!(popup.panel_id.starts_with("gid_"));
        assert_eq!(popup.kind, AlertKind::Error);
        assert_eq!(popup.title, "Save failed");
        // no template document available, so the body stays empty
        assert!(popup.body.is_empty());
    }

    #[test]
    fn populate_select_preserves_caller_order() {
        let mut select = Select::default();
        populate_select(
            &mut select,
            &SelectOptions::Ordered(vec![
                ("b".to_string(), "Bee".to_string()),
                ("a".to_string(), "Ay".to_string()),
                ("c".to_string(), "Sea".to_string()),
            ]),
            None,
        );

        let keys: Vec<&str> = select.options().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        // first appended entry is selected
        assert_eq!(select.value(), Some("b"));
    }

    #[test]
    fn populate_select_selected_key_overrides() {
        let mut select = Select::default();
        populate_select(
            &mut select,
            &SelectOptions::Ordered(vec![
                ("x".to_string(), "X".to_string()),
                ("y".to_string(), "Y".to_string()),
            ]),
            Some("y"),
        );
        assert_eq!(select.value(), Some("y"));
    }

    #[test]
    fn populate_select_keyed_input_has_all_entries() {
        let mut map = HashMap::new();
        map.insert("one".to_string(), "One".to_string());
        map.insert("two".to_string(), "Two".to_string());

        let mut select = Select::default();
        populate_select(&mut select, &SelectOptions::Keyed(map), Some("two"));

        // membership and selection, never order: keyed input is unordered
        assert_eq!(select.options().len(), 2);
        assert_eq!(select.value(), Some("two"));
    }

    #[test]
    fn repopulating_clears_previous_options() {
        let mut select = Select::default();
        populate_select(
            &mut select,
            &SelectOptions::Ordered(vec![("old".to_string(), "Old".to_string())]),
            None,
        );
        populate_select(
            &mut select,
            &SelectOptions::Ordered(vec![("new".to_string(), "New".to_string())]),
            None,
        );
        assert_eq!(select.options().len(), 1);
        assert_eq!(select.value(), Some("new"));
    }
}
