//! Dropdown checkbox list

use crate::id::IdGen;

#[derive(Debug, Clone)]
pub struct CheckItem {
    pub code: String,
    pub label: String,
    pub checked: bool,
}

/// Titled dropdown of checkboxes in input order. Toggling fires the
/// change handler with the widget and never closes the dropdown; only
/// an explicit close does.
pub struct DropDownCheckboxList {
    panel_id: String,
    title: String,
    items: Vec<CheckItem>,
    open: bool,
    cursor: usize,
    change_handler: Option<Box<dyn FnMut(&DropDownCheckboxList)>>,
}

impl DropDownCheckboxList {
    pub fn new(ids: &IdGen, title: impl Into<String>, items: Vec<CheckItem>) -> Self {
        Self {
            panel_id: ids.next_id(),
            title: title.into(),
            items,
            open: false,
            cursor: 0,
            change_handler: None,
        }
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn items(&self) -> &[CheckItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_next(&mut self) {
        if !self.items.is_empty() {
            self.cursor = (self.cursor + 1) % self.items.len();
        }
    }

    pub fn cursor_prev(&mut self) {
        if !self.items.is_empty() {
            self.cursor = self.cursor.checked_sub(1).unwrap_or(self.items.len() - 1);
        }
    }

    /// Flips one checkbox and fires the change handler. The dropdown
    /// stays open. Out-of-range indexes are ignored.
    pub fn toggle(&mut self, index: usize) {
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        item.checked = !item.checked;
        self.fire_change();
    }

    pub fn toggle_cursor(&mut self) {
        self.toggle(self.cursor);
    }

    /// Checked states, parallel to the input items, read live.
    pub fn get_item_selection_list(&self) -> Vec<bool> {
        self.items.iter().map(|item| item.checked).collect()
    }

    /// Registers the change handler, replacing any previous one.
    pub fn on_change<F: FnMut(&DropDownCheckboxList) + 'static>(&mut self, handler: F) {
        self.change_handler = Some(Box::new(handler));
    }

    fn fire_change(&mut self) {
        if let Some(mut handler) = self.change_handler.take() {
            handler(self);
            self.change_handler = Some(handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn items() -> Vec<CheckItem> {
        vec![
            CheckItem {
                code: "x".to_string(),
                label: "X".to_string(),
                checked: true,
            },
            CheckItem {
                code: "y".to_string(),
                label: "Y".to_string(),
                checked: false,
            },
        ]
    }

    #[test]
    fn selection_list_parallels_the_items() {
        let widget = DropDownCheckboxList::new(&IdGen::new(), "Langs", items());
        assert_eq!(widget.get_item_selection_list(), vec![true, false]);
    }

    #[test]
    fn toggle_flips_and_fires_exactly_once() {
        let mut widget = DropDownCheckboxList::new(&IdGen::new(), "Langs", items());
        let fired = Rc::new(Cell::new(0));
        let count = fired.clone();
        widget.on_change(move |w| {
            count.set(count.get() + 1);
            // the handler receives the widget with the fresh state
            assert_eq!(w.get_item_selection_list().len(), 2);
        });

        widget.toggle(1);
        assert_eq!(widget.get_item_selection_list(), vec![true, true]);
        assert_eq!(fired.get(), 1);

        widget.toggle(1);
        assert_eq!(widget.get_item_selection_list(), vec![true, false]);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn toggling_does_not_close_the_dropdown() {
        let mut widget = DropDownCheckboxList::new(&IdGen::new(), "Langs", items());
        widget.open();
        widget.toggle_cursor();
        assert!(widget.is_open());
        widget.close();
        assert!(!widget.is_open());
    }

    #[test]
    fn out_of_range_toggle_is_a_no_op() {
        let mut widget = DropDownCheckboxList::new(&IdGen::new(), "Langs", items());
        let fired = Rc::new(Cell::new(0));
        let count = fired.clone();
        widget.on_change(move |_| count.set(count.get() + 1));

        widget.toggle(99);
        assert_eq!(fired.get(), 0);
    }
}
