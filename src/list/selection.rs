//! Multi-select state of a flat deal list.

use std::collections::BTreeSet;

use crate::types::DealId;

/// Selected deal ids, scoped to one list view.
///
/// Toggling a deal enters multi-select mode; leaving the mode clears the
/// selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: BTreeSet<DealId>,
    multi_select: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a deal's selection. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &DealId) -> bool {
        self.multi_select = true;
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Select every visible deal
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a DealId>) {
        self.multi_select = true;
        self.ids.extend(visible.into_iter().cloned());
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &DealId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in a stable order
    pub fn ids(&self) -> Vec<DealId> {
        self.ids.iter().cloned().collect()
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn enter_multi_select(&mut self) {
        self.multi_select = true;
    }

    /// Leave multi-select mode, dropping the selection
    pub fn exit_multi_select(&mut self) {
        self.multi_select = false;
        self.ids.clear();
    }
}
