//! Key/value table editor

use std::collections::BTreeMap;

use crate::id::IdGen;

#[derive(Debug, Clone)]
pub struct MapRow {
    pub row_id: u32,
    pub key: String,
    pub value: String,
}

/// Editable table of key/value rows. The row-id counter starts at 1 and
/// only ever generates unique ids; the logical map is recomputed from
/// the rows on every query, so a row belongs to the map iff its key is
/// non-empty at that moment.
pub struct TableMap {
    panel_id: String,
    next_row_id: u32,
    rows: Vec<MapRow>,
    selected: usize,
    blur_handler: Option<Box<dyn FnMut(&TableMap)>>,
}

impl TableMap {
    pub fn new(ids: &IdGen, initial: &BTreeMap<String, String>) -> Self {
        let mut widget = Self {
            panel_id: ids.next_id(),
            next_row_id: 1,
            rows: Vec::new(),
            selected: 0,
            blur_handler: None,
        };
        for (key, value) in initial {
            widget.add_row(key, value);
        }
        widget
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    /// Appends a row and returns its generated row id.
    pub fn add_row(&mut self, key: &str, value: &str) -> u32 {
        let row_id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.push(MapRow {
            row_id,
            key: key.to_string(),
            value: value.to_string(),
        });
        row_id
    }

    /// Removes the row and fires the blur handler, as if the user had
    /// blurred one of its inputs. Unknown ids are ignored.
    pub fn remove_row(&mut self, row_id: u32) {
        let before = self.rows.len();
        self.rows.retain(|r| r.row_id != row_id);
        if self.rows.len() == before {
            return;
        }
        if self.selected >= self.rows.len() && self.selected > 0 {
            self.selected -= 1;
        }
        self.notify_blur();
    }

    /// Overwrites a row's key and value, then fires the blur handler.
    pub fn set_row(&mut self, row_id: u32, key: &str, value: &str) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| r.row_id == row_id) else {
            return false;
        };
        row.key = key.to_string();
        row.value = value.to_string();
        self.notify_blur();
        true
    }

    /// The logical map: rows scanned in order, empty keys skipped,
    /// later duplicates overwriting earlier ones.
    pub fn get_as_map(&self) -> BTreeMap<String, String> {
        let mut result = BTreeMap::new();
        for row in &self.rows {
            if !row.key.is_empty() {
                result.insert(row.key.clone(), row.value.clone());
            }
        }
        result
    }

    pub fn rows(&self) -> &[MapRow] {
        &self.rows
    }

    pub fn selected_row(&self) -> Option<&MapRow> {
        self.rows.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + 1) % self.rows.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.rows.is_empty() {
            self.selected = self.selected.checked_sub(1).unwrap_or(self.rows.len() - 1);
        }
    }

    /// Registers the blur handler, replacing any previous one. The
    /// handler covers every current and future row.
    pub fn on_blur<F: FnMut(&TableMap) + 'static>(&mut self, handler: F) {
        self.blur_handler = Some(Box::new(handler));
    }

    pub fn clear_blur(&mut self) {
        self.blur_handler = None;
    }

    /// Fires the blur handler with the widget.
    pub fn notify_blur(&mut self) {
        if let Some(mut handler) = self.blur_handler.take() {
            handler(self);
            self.blur_handler = Some(handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn empty() -> TableMap {
        TableMap::new(&IdGen::new(), &BTreeMap::new())
    }

    #[test]
    fn rows_with_empty_keys_are_excluded() {
        let mut table = empty();
        let x = table.add_row("x", "1");
        table.add_row("y", "2");

        assert_eq!(table.get_as_map().len(), 2);

        // clearing a key removes the row from the map, not the table
        table.set_row(x, "", "1");
        let map = table.get_as_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("y").map(String::as_str), Some("2"));
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn duplicate_keys_last_one_wins() {
        let mut table = empty();
        table.add_row("x", "1");
        table.add_row("x", "2");

        let map = table.get_as_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x").map(String::as_str), Some("2"));
    }

    #[test]
    fn row_ids_start_at_one_and_stay_unique() {
        let mut table = empty();
        let a = table.add_row("a", "");
        let b = table.add_row("b", "");
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        table.remove_row(a);
        // removed ids are never reused
        assert_eq!(table.add_row("c", ""), 3);
    }

    #[test]
    fn removing_a_row_fires_blur() {
        let mut table = empty();
        let row = table.add_row("x", "1");
        table.add_row("y", "2");

        let fired = Rc::new(Cell::new(0));
        let count = fired.clone();
        table.on_blur(move |t| {
            count.set(count.get() + 1);
            assert!(!t.get_as_map().contains_key("x"));
        });

        table.remove_row(row);
        assert_eq!(fired.get(), 1);

        // unknown id is a no-op
        table.remove_row(999);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn registering_a_blur_handler_replaces_the_previous_one() {
        let mut table = empty();
        let row = table.add_row("k", "v");

        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let f = first.clone();
        table.on_blur(move |_| f.set(f.get() + 1));
        let s = second.clone();
        table.on_blur(move |_| s.set(s.get() + 1));

        table.set_row(row, "k", "edited");
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn initial_map_becomes_rows() {
        let mut initial = BTreeMap::new();
        initial.insert("author".to_string(), "A. Person".to_string());
        initial.insert("email".to_string(), "a@example.org".to_string());

        let table = TableMap::new(&IdGen::new(), &initial);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.get_as_map(), initial);
    }
}
