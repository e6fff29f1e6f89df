//! Deal query predicates.
//!
//! A [`Filter`] is the canonical predicate for one list or board. Edits are
//! staged in a [`FilterDraft`] and only become a `Filter` when applied
//! through the [`store::FilterStore`]. The wire form is a [`QueryBody`],
//! which carries only the facets that are actually set.

pub mod store;

use std::collections::BTreeSet;

use jiff::civil::Date;
use serde::Serialize;

use crate::date_range::{self, DatePreset, DateRange};
use crate::error::{DealboardError, Result};

pub use store::{FilterRevision, FilterStore, ListKind, ListTab, ViewKey};

/// Upper bound on free-text search length accepted by the API
pub const MAX_SEARCH_LEN: usize = 200;

/// The stored query predicate for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub date_range: DateRange,
    /// Preset that produced `date_range`, `None` for a custom interval
    pub preset: Option<DatePreset>,
    pub tags: BTreeSet<String>,
    pub sources: BTreeSet<String>,
    pub assignees: BTreeSet<String>,
    pub status_codes: BTreeSet<String>,
    pub search: Option<String>,
    /// Distinguishes an explicitly applied filter from the untouched default
    pub is_filter_applied: bool,
}

impl Filter {
    /// Filter covering a preset interval with no other facets.
    pub fn with_preset(preset: DatePreset, today: Date) -> Result<Self> {
        Ok(Self {
            date_range: date_range::resolve(preset, today)?,
            preset: Some(preset),
            tags: BTreeSet::new(),
            sources: BTreeSet::new(),
            assignees: BTreeSet::new(),
            status_codes: BTreeSet::new(),
            search: None,
            is_filter_applied: false,
        })
    }

    /// Default filter for a list kind.
    pub fn default_for(kind: ListKind, today: Date) -> Result<Self> {
        Self::with_preset(kind.default_preset(), today)
    }

    /// Check the predicate before it is stored.
    pub fn validate(&self) -> Result<()> {
        if self.date_range.from > self.date_range.to {
            return Err(DealboardError::InvalidDateRange(format!(
                "start {} is after end {}",
                self.date_range.from, self.date_range.to
            )));
        }
        if let Some(search) = &self.search
            && search.chars().count() > MAX_SEARCH_LEN
        {
            return Err(DealboardError::InvalidFilter(format!(
                "search text longer than {MAX_SEARCH_LEN} characters"
            )));
        }
        for facet in [&self.tags, &self.sources, &self.assignees, &self.status_codes] {
            if facet.iter().any(|value| value.trim().is_empty()) {
                return Err(DealboardError::InvalidFilter(
                    "facet values cannot be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Wire form of the predicate, carrying only the facets that are set.
    pub fn query_body(&self) -> QueryBody {
        QueryBody {
            from: Some(self.date_range.from.to_string()),
            to: Some(self.date_range.to.to_string()),
            tags: non_empty(&self.tags),
            sources: non_empty(&self.sources),
            assignees: non_empty(&self.assignees),
            status_codes: non_empty(&self.status_codes),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Content-derived invalidation key.
    ///
    /// Two filters with the same facets produce the same key no matter how
    /// they were built. An unapplied filter maps to the unfiltered key since
    /// consumers fall back to the unfiltered query for it.
    pub fn query_key(&self) -> QueryKey {
        if !self.is_filter_applied {
            return QueryKey::unfiltered();
        }
        QueryKey(serde_json::to_string(&self.query_body()).unwrap_or_default())
    }

    /// Predicate to send with page requests, `None` for the unfiltered query.
    pub fn request_body(&self) -> Option<QueryBody> {
        self.is_filter_applied.then(|| self.query_body())
    }

    /// This filter with its search text replaced, or `None` when the
    /// trimmed text is what is already set.
    pub fn with_search(&self, text: &str) -> Option<Filter> {
        let mut draft = FilterDraft::from_filter(self);
        draft.set_search(text);
        let next = draft.into_filter();
        let trimmed = |f: &Filter| f.search.as_deref().map(str::trim).map(str::to_owned);
        (trimmed(&next) != trimmed(self)).then_some(next)
    }
}

fn non_empty(values: &BTreeSet<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().cloned().collect())
    }
}

/// Serialized predicate sent to the pipeline API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Dependency key that paginated queries are loaded under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn unfiltered() -> Self {
        QueryKey("*".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Transient edits to a filter, held until the user applies them.
#[derive(Debug, Clone)]
pub struct FilterDraft {
    filter: Filter,
}

impl FilterDraft {
    /// Start editing from the currently stored filter
    pub fn from_filter(filter: &Filter) -> Self {
        Self {
            filter: filter.clone(),
        }
    }

    pub fn set_preset(&mut self, preset: DatePreset, today: Date) -> Result<()> {
        self.filter.date_range = date_range::resolve(preset, today)?;
        self.filter.preset = Some(preset);
        Ok(())
    }

    /// Set an explicit interval. The preset is re-detected so that picking
    /// the same days as a preset by hand still reads as that preset.
    pub fn set_range(&mut self, range: DateRange, today: Date) {
        self.filter.preset = date_range::detect(&range, today);
        self.filter.date_range = range;
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        toggle(&mut self.filter.tags, tag);
    }

    pub fn toggle_source(&mut self, source: &str) {
        toggle(&mut self.filter.sources, source);
    }

    pub fn toggle_assignee(&mut self, assignee: &str) {
        toggle(&mut self.filter.assignees, assignee);
    }

    pub fn toggle_status(&mut self, code: &str) {
        toggle(&mut self.filter.status_codes, code);
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.filter.search = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
    }

    /// Number of facets that narrow the query beyond the date range
    pub fn active_facet_count(&self) -> usize {
        [
            !self.filter.tags.is_empty(),
            !self.filter.sources.is_empty(),
            !self.filter.assignees.is_empty(),
            !self.filter.status_codes.is_empty(),
            self.filter.search.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Finish editing. The result still has to go through the store.
    pub fn into_filter(self) -> Filter {
        self.filter
    }
}

fn toggle(values: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !values.remove(value) {
        values.insert(value.to_string());
    }
}
