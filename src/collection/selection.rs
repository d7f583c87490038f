//! Multi-select state for list screens
//!
//! Selection is keyed by identifier, not row position, so it survives page
//! navigation, filtering, and sorting. Entries leave the set only through an
//! explicit deselect or clear.

use std::collections::HashSet;

use serde::Serialize;

/// How much of the visible page is selected (drives the header checkbox)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSelection {
    #[default]
    None,
    Partial,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected identifiers in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Add if absent, remove if present. Returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Add `id`. Returns false if it was already selected.
    pub fn select(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// Remove `id`. Returns false if it was not selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Toggle the visible page as a block.
    ///
    /// If every visible identifier is already selected, exactly those are
    /// deselected; otherwise all of them are added. Selections on other pages
    /// are left alone. Returns the resulting page state.
    pub fn select_page<S: AsRef<str>>(&mut self, visible: &[S]) -> PageSelection {
        if visible.is_empty() {
            return PageSelection::None;
        }

        if self.page_state(visible) == PageSelection::All {
            for id in visible {
                self.ids.remove(id.as_ref());
            }
            PageSelection::None
        } else {
            for id in visible {
                self.ids.insert(id.as_ref().to_string());
            }
            PageSelection::All
        }
    }

    /// Add every identifier matching the current filter, across all pages.
    /// Returns how many were newly added.
    pub fn select_all_matching<S: AsRef<str>>(&mut self, matching: &[S]) -> usize {
        matching
            .iter()
            .filter(|id| self.ids.insert(id.as_ref().to_string()))
            .count()
    }

    /// Empty the selection. Returns how many entries were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.ids.len();
        self.ids.clear();
        removed
    }

    pub fn page_state<S: AsRef<str>>(&self, visible: &[S]) -> PageSelection {
        let selected = visible
            .iter()
            .filter(|id| self.ids.contains(id.as_ref()))
            .count();
        match selected {
            0 => PageSelection::None,
            n if n == visible.len() => PageSelection::All,
            _ => PageSelection::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut selection = Selection::new();
        assert!(selection.toggle("v1"));
        assert!(selection.contains("v1"));
        assert!(!selection.toggle("v1"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_page_adds_missing_rows() {
        let mut selection = Selection::new();
        selection.toggle("a");

        let state = selection.select_page(&page(&["a", "b", "c"]));
        assert_eq!(state, PageSelection::All);
        assert_eq!(selection.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_select_page_deselects_only_visible_rows() {
        let mut selection = Selection::new();
        selection.toggle("other-page");
        selection.select_page(&page(&["a", "b"]));

        let state = selection.select_page(&page(&["a", "b"]));
        assert_eq!(state, PageSelection::None);
        assert_eq!(selection.ids(), vec!["other-page"]);
    }

    #[test]
    fn test_select_page_twice_restores_original_selection() {
        let visible = page(&["a", "b", "c"]);
        for initial in [vec![], vec!["x"], vec!["x", "b"]] {
            let mut selection = Selection::new();
            for id in &initial {
                selection.toggle(id);
            }
            let before = selection.clone();

            selection.select_page(&visible);
            selection.select_page(&visible);

            if before.page_state(&visible) == PageSelection::Partial {
                // A partial page becomes fully selected, then fully cleared
                let mut expected = before.clone();
                for id in &visible {
                    expected.deselect(id);
                }
                assert_eq!(selection, expected);
            } else {
                assert_eq!(selection, before);
            }
        }
    }

    #[test]
    fn test_select_page_on_empty_page_is_noop() {
        let mut selection = Selection::new();
        selection.toggle("a");
        let empty: Vec<String> = vec![];
        assert_eq!(selection.select_page(&empty), PageSelection::None);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_select_all_matching_counts_new_entries() {
        let mut selection = Selection::new();
        selection.toggle("a");
        let added = selection.select_all_matching(&page(&["a", "b", "c"]));
        assert_eq!(added, 2);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_page_state() {
        let mut selection = Selection::new();
        let visible = page(&["a", "b"]);
        assert_eq!(selection.page_state(&visible), PageSelection::None);
        selection.toggle("a");
        assert_eq!(selection.page_state(&visible), PageSelection::Partial);
        selection.toggle("b");
        assert_eq!(selection.page_state(&visible), PageSelection::All);
    }

    #[test]
    fn test_clear_reports_removed() {
        let mut selection = Selection::new();
        selection.select_all_matching(&page(&["a", "b"]));
        assert_eq!(selection.clear(), 2);
        assert!(selection.is_empty());
    }
}
