//! Visible result window and the user's selection within it

use std::collections::HashSet;

use crate::publication::Publication;

/// Filter and page window applied to the result list
///
/// Selection operations only ever touch what this window shows, never the
/// full unfiltered result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    /// Case-insensitive text matched against title, authors and journal
    pub filter: String,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl Default for ResultView {
    fn default() -> Self {
        Self {
            filter: String::new(),
            page: 0,
            page_size: 10,
        }
    }
}

impl ResultView {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter = filter.into();
        self.page = 0;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Results passing the filter, before pagination
    pub fn filtered<'a>(&self, results: &'a [Publication]) -> Vec<&'a Publication> {
        results
            .iter()
            .filter(|p| p.matches_filter(&self.filter))
            .collect()
    }

    /// The records currently on screen
    pub fn visible<'a>(&self, results: &'a [Publication]) -> Vec<&'a Publication> {
        let page_size = self.page_size.max(1);
        self.filtered(results)
            .into_iter()
            .skip(self.page * page_size)
            .take(page_size)
            .collect()
    }

    pub fn page_count(&self, results: &[Publication]) -> usize {
        self.filtered(results).len().div_ceil(self.page_size.max(1))
    }
}

/// Publication ids the user picked from the current results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `id` if it is visible; returns whether it ends up selected
    pub fn toggle(&mut self, id: &str, visible: &[&Publication]) -> bool {
        if !visible.iter().any(|p| p.id == id) {
            return self.ids.contains(id);
        }

        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
            true
        } else {
            false
        }
    }

    /// Select every visible record, leaving other selections alone
    pub fn select_all(&mut self, visible: &[&Publication]) {
        self.ids.extend(visible.iter().map(|p| p.id.clone()));
    }

    /// Deselect every visible record, leaving other selections alone
    pub fn clear(&mut self, visible: &[&Publication]) {
        for publication in visible {
            self.ids.remove(&publication.id);
        }
    }

    /// Header checkbox state for the visible window
    pub fn all_selected(&self, visible: &[&Publication]) -> bool {
        !visible.is_empty() && visible.iter().all(|p| self.ids.contains(&p.id))
    }

    /// Drop everything, used when results are replaced
    pub fn reset(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that are no longer among `results`
    pub fn retain_present(&mut self, results: &[Publication]) {
        let present: HashSet<&str> = results.iter().map(|p| p.id.as_str()).collect();
        self.ids.retain(|id| present.contains(id.as_str()));
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

    /// Selected records in result order
    pub fn selected_in<'a>(&self, results: &'a [Publication]) -> Vec<&'a Publication> {
        results
            .iter()
            .filter(|p| self.ids.contains(&p.id))
            .collect()
    }
}
