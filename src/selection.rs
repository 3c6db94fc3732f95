use std::collections::HashSet;

use crate::value::RowKey;

/// Explicitly selected keys plus a "select all" flag.
///
/// The flag dominates: while it is set every row reads as selected, whatever
/// the explicit set holds. Toggling single rows still edits the explicit set,
/// which becomes visible again once the flag is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: HashSet<RowKey>,
    all: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `key`. Returns true if the key is now in the set.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.selected.remove(key) {
            false
        } else {
            self.selected.insert(key.to_string());
            true
        }
    }

    pub fn select_all(&mut self, flag: bool) {
        self.all = flag;
    }

    pub fn toggle_all(&mut self) -> bool {
        self.all = !self.all;
        self.all
    }

    pub fn is_all_selected(&self) -> bool {
        self.all
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.all || self.selected.contains(key)
    }

    pub fn selected_count(&self, total_rows: usize) -> usize {
        if self.all {
            total_rows
        } else {
            self.selected.len()
        }
    }

    /// Drops explicit keys that fail `keep`, e.g. after the rows were replaced.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.selected.retain(|key| keep(key.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle("1"));
        assert!(selection.is_selected("1"));
        assert!(!selection.toggle("1"));
        assert!(!selection.is_selected("1"));
        assert_eq!(selection, SelectionSet::new());
    }

    #[test]
    fn select_all_dominates() {
        let mut selection = SelectionSet::new();
        selection.toggle("1");
        selection.select_all(true);
        assert_eq!(selection.selected_count(42), 42);
        assert!(selection.is_selected("7"));

        // per-row toggles cannot deselect while the flag is set
        selection.toggle("1");
        assert!(selection.is_selected("1"));

        selection.select_all(false);
        assert!(!selection.is_selected("1"));
        assert_eq!(selection.selected_count(42), 0);
    }

    #[test]
    fn select_all_leaves_explicit_set_alone() {
        let mut selection = SelectionSet::new();
        selection.toggle("a");
        selection.toggle("b");
        assert!(selection.toggle_all());
        assert!(!selection.toggle_all());
        assert_eq!(selection.selected_count(10), 2);
    }

    #[test]
    fn retain_prunes_unknown_keys() {
        let mut selection = SelectionSet::new();
        selection.toggle("1");
        selection.toggle("2");
        selection.retain(|key| key == "2");
        assert!(!selection.is_selected("1"));
        assert!(selection.is_selected("2"));
        assert_eq!(selection.selected_count(5), 1);
    }
}
