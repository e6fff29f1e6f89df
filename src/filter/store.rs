//! Per-view filter state.
//!
//! The store keeps one canonical [`Filter`] per [`ViewKey`]. It only changes
//! through [`FilterStore::apply`] and [`FilterStore::clear`]; every change
//! bumps the view's revision so dependent paginated queries can tell their
//! offsets were computed under a different predicate.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::civil::Date;
use parking_lot::RwLock;

use super::{Filter, QueryKey};
use crate::date_range::{self, DatePreset};
use crate::enum_display_fromstr;
use crate::error::{DealboardError, Result};

/// Which list a filter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Customers,
    Deals,
}

enum_display_fromstr!(ListKind, DealboardError::Config, {
    Customers => "customers",
    Deals => "deals",
});

impl ListKind {
    /// Date preset a cleared filter falls back to
    pub fn default_preset(self) -> DatePreset {
        match self {
            ListKind::Customers => DatePreset::Last30Days,
            ListKind::Deals => DatePreset::AllTime,
        }
    }

    /// Whether a cleared filter still counts as applied.
    ///
    /// Deals stay unapplied after a clear so boards fall back to the cheaper
    /// unfiltered query.
    pub fn applied_after_clear(self) -> bool {
        match self {
            ListKind::Customers => true,
            ListKind::Deals => false,
        }
    }
}

/// Manual vs. system-generated records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListTab {
    #[default]
    Manual,
    System,
}

enum_display_fromstr!(ListTab, DealboardError::Config, {
    Manual => "manual",
    System => "system",
});

/// Identifies one independently filtered view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub list: ListKind,
    pub tab: ListTab,
    pub archived: bool,
}

impl ViewKey {
    pub fn new(list: ListKind, tab: ListTab, archived: bool) -> Self {
        Self {
            list,
            tab,
            archived,
        }
    }

    /// The live (non-archived) deal pipeline
    pub fn pipeline() -> Self {
        Self::new(ListKind::Deals, ListTab::Manual, false)
    }

    /// The same view with the archived flag flipped
    pub fn toggle_archived(self) -> Self {
        Self {
            archived: !self.archived,
            ..self
        }
    }
}

/// Outcome of a store mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRevision {
    pub key: ViewKey,
    pub revision: u64,
}

#[derive(Debug)]
struct Entry {
    filter: Filter,
    revision: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<ViewKey, Entry>,
    anchor: Option<Date>,
}

/// Shared handle to the filter state of every view.
///
/// Cloning the handle shares the underlying state, so a board and a flat
/// list over the same view observe the same filter.
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose default date ranges are anchored on a fixed day
    pub fn with_anchor(today: Date) -> Self {
        let store = Self::default();
        store.inner.write().anchor = Some(today);
        store
    }

    /// The calendar day default ranges are resolved against
    pub fn today(&self) -> Date {
        self.inner.read().anchor.unwrap_or_else(date_range::today)
    }

    /// The filter currently in effect for a view
    pub fn get_current(&self, key: ViewKey) -> Result<Filter> {
        if let Some(entry) = self.inner.read().entries.get(&key) {
            return Ok(entry.filter.clone());
        }
        Filter::default_for(key.list, self.today())
    }

    /// Replace the view's filter wholesale and mark it applied.
    ///
    /// A filter that fails validation is rejected and the previous filter
    /// stays active.
    pub fn apply(&self, key: ViewKey, filter: Filter) -> Result<FilterRevision> {
        filter.validate()?;
        let mut filter = filter;
        filter.is_filter_applied = true;
        Ok(self.store(key, filter))
    }

    /// Reset the view's filter to its default.
    pub fn clear(&self, key: ViewKey) -> Result<FilterRevision> {
        let mut filter = Filter::default_for(key.list, self.today())?;
        filter.is_filter_applied = key.list.applied_after_clear();
        Ok(self.store(key, filter))
    }

    fn store(&self, key: ViewKey, filter: Filter) -> FilterRevision {
        let mut inner = self.inner.write();
        let revision = inner.entries.get(&key).map_or(0, |e| e.revision) + 1;
        tracing::debug!(
            view = ?key,
            revision,
            applied = filter.is_filter_applied,
            "filter changed"
        );
        inner.entries.insert(key, Entry { filter, revision });
        FilterRevision { key, revision }
    }

    /// Number of times the view's filter has changed
    pub fn revision(&self, key: ViewKey) -> u64 {
        self.inner.read().entries.get(&key).map_or(0, |e| e.revision)
    }

    /// Invalidation key of the view's current filter
    pub fn query_key(&self, key: ViewKey) -> Result<QueryKey> {
        Ok(self.get_current(key)?.query_key())
    }
}
