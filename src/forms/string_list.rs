//! Ordered string-list editor

use crate::id::IdGen;

#[derive(Debug, Clone)]
pub struct StringListOptions {
    /// Visible rows.
    pub size: u16,
    /// Singular noun used in dialog titles and labels.
    pub item: String,
}

impl Default for StringListOptions {
    fn default() -> Self {
        Self {
            size: 10,
            item: "item".to_string(),
        }
    }
}

/// Editable ordered list of strings with a single selection. Add and
/// edit go through text-input dialogs driven by the host; confirmed
/// text is trimmed and ignored when empty.
pub struct StringList {
    panel_id: String,
    options: StringListOptions,
    items: Vec<String>,
    selected: Option<usize>,
    change_handler: Option<Box<dyn FnMut(&[String])>>,
}

impl StringList {
    pub fn new(ids: &IdGen, initial: &[String], options: StringListOptions) -> Self {
        Self {
            panel_id: ids.next_id(),
            options,
            items: initial.to_vec(),
            selected: if initial.is_empty() { None } else { Some(0) },
            change_handler: None,
        }
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    pub fn size(&self) -> u16 {
        self.options.size
    }

    /// The noun for one entry ("keyword", "contributor", ...).
    pub fn item_noun(&self) -> &str {
        &self.options.item
    }

    /// Appends confirmed dialog text. Empty after trimming is a no-op;
    /// otherwise the change handler fires with the new full list.
    pub fn add(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.items.push(trimmed.to_string());
        if self.selected.is_none() {
            self.selected = Some(0);
        }
        self.fire_change();
    }

    /// Deletes the selected entry; no-op when nothing is selected.
    pub fn remove_selected(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        self.items.remove(index);
        self.selected = if self.items.is_empty() {
            None
        } else {
            Some(index.min(self.items.len() - 1))
        };
        self.fire_change();
    }

    /// Replaces the selected entry with confirmed dialog text. Empty
    /// after trimming, or no selection, is a no-op.
    pub fn edit_selected(&mut self, text: &str) {
        let Some(index) = self.selected else {
            return;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.items[index] = trimmed.to_string();
        self.fire_change();
    }

    pub fn get_as_list(&self) -> Vec<String> {
        self.items.clone()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected.and_then(|i| self.items.get(i)).map(String::as_str)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            if i + 1 < self.items.len() {
                self.selected = Some(i + 1);
            }
        } else if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        } else if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    /// Registers the change handler, replacing any previous one. It
    /// receives the new full list after every mutation.
    pub fn on_change<F: FnMut(&[String]) + 'static>(&mut self, handler: F) {
        self.change_handler = Some(Box::new(handler));
    }

    fn fire_change(&mut self) {
        if let Some(handler) = self.change_handler.as_mut() {
            handler(&self.items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn list(initial: &[&str]) -> StringList {
        let items: Vec<String> = initial.iter().map(|s| s.to_string()).collect();
        StringList::new(&IdGen::new(), &items, StringListOptions::default())
    }

    #[test]
    fn construction_preserves_order_and_selects_first() {
        let widget = list(&["a", "b"]);
        assert_eq!(widget.get_as_list(), vec!["a", "b"]);
        assert_eq!(widget.selected_value(), Some("a"));
    }

    #[test]
    fn add_fires_change_with_the_exact_list() {
        let mut widget = list(&["a", "b"]);
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        widget.on_change(move |items| sink.borrow_mut().push(items.to_vec()));

        widget.add("  c  ");

        assert_eq!(widget.get_as_list(), vec!["a", "b", "c"]);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], vec!["a", "b", "c"]);
    }

    #[test]
    fn add_of_blank_text_is_a_no_op() {
        let mut widget = list(&["a"]);
        let fired = Rc::new(RefCell::new(0));
        let sink = fired.clone();
        widget.on_change(move |_| *sink.borrow_mut() += 1);

        widget.add("   ");
        assert_eq!(widget.get_as_list(), vec!["a"]);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn remove_deletes_the_selected_entry() {
        let mut widget = list(&["a", "b", "c"]);
        widget.select_next(); // selection on "b"

        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        widget.on_change(move |items| sink.borrow_mut().push(items.to_vec()));

        widget.remove_selected();
        assert_eq!(widget.get_as_list(), vec!["a", "c"]);
        assert_eq!(seen.borrow().len(), 1);
        // selection clamps to the next remaining entry
        assert_eq!(widget.selected_value(), Some("c"));
    }

    #[test]
    fn remove_without_selection_is_a_no_op() {
        let mut widget = list(&[]);
        let fired = Rc::new(RefCell::new(0));
        let sink = fired.clone();
        widget.on_change(move |_| *sink.borrow_mut() += 1);

        widget.remove_selected();
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn edit_replaces_in_place() {
        let mut widget = list(&["a", "b"]);
        widget.select_next();
        widget.edit_selected(" beta ");
        assert_eq!(widget.get_as_list(), vec!["a", "beta"]);

        // blank edit leaves the value alone
        widget.edit_selected("  ");
        assert_eq!(widget.get_as_list(), vec!["a", "beta"]);
    }

    #[test]
    fn registering_a_change_handler_replaces_the_previous_one() {
        let mut widget = list(&[]);
        let first = Rc::new(RefCell::new(0));
        let second = Rc::new(RefCell::new(0));
        let f = first.clone();
        widget.on_change(move |_| *f.borrow_mut() += 1);
        let s = second.clone();
        widget.on_change(move |_| *s.borrow_mut() += 1);

        widget.add("x");
        assert_eq!(*first.borrow(), 0);
        assert_eq!(*second.borrow(), 1);
    }
}
