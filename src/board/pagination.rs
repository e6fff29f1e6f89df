//! Per-column incremental pagination.
//!
//! Every stage column owns a [`PagedColumn`]: the deals materialized so far
//! plus a [`ColumnPagination`] cursor. A page load is split into
//! [`PagedColumn::begin_load`], which hands out a [`PageTicket`], and
//! [`PagedColumn::complete_load`], which applies the response for that
//! ticket. Tickets carry the column generation they were issued under, so a
//! response that lands after a reset is dropped instead of being mixed into
//! the fresh column.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{DealboardError, Result};
use crate::remote::DealPage;
use crate::types::{Deal, DealId, StageId};

/// Pagination cursor of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPagination {
    /// Offset of the next page
    pub offset: usize,
    pub has_more: bool,
    /// A page request is in flight
    pub is_loading: bool,
    /// No page has completed since the column was created or reset
    pub initial_loading: bool,
    /// Server total for the column under the current filter
    pub total_items: usize,
    /// Deals currently materialized client-side
    pub loaded_items: usize,
    /// Bumped on every reset
    #[serde(skip)]
    pub generation: u64,
    /// Message of the last failed page load, cleared by the next attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Default for ColumnPagination {
    fn default() -> Self {
        Self {
            offset: 0,
            has_more: true,
            is_loading: false,
            initial_loading: true,
            total_items: 0,
            loaded_items: 0,
            generation: 0,
            last_error: None,
        }
    }
}

/// Lifecycle phase derived from the cursor flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPhase {
    /// Nothing loaded and nothing in flight
    Empty,
    /// First page in flight
    InitialLoading,
    /// At least one page applied
    Loaded { has_more: bool },
    /// A follow-up page is in flight
    Loading,
}

impl ColumnPagination {
    pub fn phase(&self) -> ColumnPhase {
        match (self.initial_loading, self.is_loading) {
            (true, true) => ColumnPhase::InitialLoading,
            (true, false) => ColumnPhase::Empty,
            (false, true) => ColumnPhase::Loading,
            (false, false) => ColumnPhase::Loaded {
                has_more: self.has_more,
            },
        }
    }

    /// Whether the scroll trigger may ask for another page
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading
    }

    fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    /// Recompute `has_more` from the counters once the first page is in.
    fn sync_has_more(&mut self) {
        if !self.initial_loading {
            self.total_items = self.total_items.max(self.loaded_items);
            self.has_more = self.loaded_items < self.total_items;
        }
    }
}

/// Identifies one issued page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    /// Column the page belongs to, `None` for the flat list
    pub stage_id: Option<StageId>,
    pub offset: usize,
    pub page_size: usize,
    pub generation: u64,
}

/// What happened to a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was applied; carries the number of deals appended
    Appended(usize),
    /// No request was issued (already loading or exhausted)
    Skipped,
    /// The response belonged to a previous generation and was dropped
    Stale,
}

/// Deals of one column plus its cursor
#[derive(Debug, Clone, Default)]
pub struct PagedColumn {
    deals: Vec<Deal>,
    state: ColumnPagination,
}

impl PagedColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn state(&self) -> &ColumnPagination {
        &self.state
    }

    pub fn position(&self, deal_id: &DealId) -> Option<usize> {
        self.deals.iter().position(|d| &d.id == deal_id)
    }

    pub fn contains(&self, deal_id: &DealId) -> bool {
        self.position(deal_id).is_some()
    }

    /// Drop all deals and return to `Empty`. In-flight responses become stale.
    pub fn reset(&mut self) {
        self.deals.clear();
        self.state.reset();
    }

    /// Start loading the next page.
    ///
    /// Returns `None` without touching state when a request is already in
    /// flight or the column is exhausted.
    pub fn begin_load(&mut self, stage_id: Option<StageId>, page_size: usize) -> Option<PageTicket> {
        if !self.state.can_load_more() {
            return None;
        }
        self.state.is_loading = true;
        self.state.last_error = None;
        Some(PageTicket {
            stage_id,
            offset: self.state.offset,
            page_size,
            generation: self.state.generation,
        })
    }

    /// Apply the response for `ticket`.
    ///
    /// A failed fetch leaves `has_more` untouched and records the error for a
    /// retry affordance; there is no automatic retry.
    pub fn complete_load(
        &mut self,
        ticket: &PageTicket,
        result: Result<DealPage>,
    ) -> Result<PageOutcome> {
        if ticket.generation != self.state.generation {
            tracing::debug!(
                stage = ?ticket.stage_id,
                issued = ticket.generation,
                current = self.state.generation,
                "dropping stale page response"
            );
            return Ok(PageOutcome::Stale);
        }

        self.state.is_loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(stage = ?ticket.stage_id, offset = ticket.offset, "page load failed: {message}");
                self.state.last_error = Some(message.clone());
                return Err(DealboardError::PageFetch(message));
            }
        };

        let returned = page.items.len();
        let mut appended = 0;
        for deal in page.items {
            if !self.contains(&deal.id) {
                self.deals.push(deal);
                appended += 1;
            }
        }

        // Moves applied while the page was in flight have already shifted the
        // cursor relative to `ticket.offset`
        self.state.offset += ticket.page_size;
        self.state.loaded_items = self.deals.len();
        self.state.total_items = if returned == 0 {
            // An empty page means the server has nothing past this offset
            self.state.loaded_items
        } else {
            page.total
        };
        self.state.initial_loading = false;
        self.state.sync_has_more();

        tracing::debug!(
            stage = ?ticket.stage_id,
            appended,
            loaded = self.state.loaded_items,
            total = self.state.total_items,
            "page applied"
        );
        Ok(PageOutcome::Appended(appended))
    }

    /// Remove a deal, adjusting counters by one.
    ///
    /// A deal leaving the fetched window shifts the server list down, so the
    /// cursor follows it.
    pub(crate) fn take(&mut self, deal_id: &DealId) -> Option<(usize, Deal)> {
        let index = self.position(deal_id)?;
        let deal = self.deals.remove(index);
        if index < self.state.offset {
            self.state.offset -= 1;
        }
        self.state.loaded_items = self.deals.len();
        self.state.total_items = self.state.total_items.saturating_sub(1);
        self.state.sync_has_more();
        Some((index, deal))
    }

    /// Insert a deal at `index` (clamped), adjusting counters by one.
    pub(crate) fn put(&mut self, index: usize, deal: Deal) -> usize {
        let index = index.min(self.deals.len());
        self.deals.insert(index, deal);
        if !self.state.initial_loading {
            self.state.offset += 1;
        }
        self.state.loaded_items = self.deals.len();
        self.state.total_items += 1;
        self.state.sync_has_more();
        index
    }

    /// Move a deal within the column. Counters are unchanged.
    pub(crate) fn reorder(&mut self, from: usize, to: usize) {
        let deal = self.deals.remove(from);
        let to = to.min(self.deals.len());
        self.deals.insert(to, deal);
    }

    pub(crate) fn clear_error(&mut self) {
        self.state.last_error = None;
    }
}

/// One independent cursor per stage column
#[derive(Debug, Clone)]
pub struct PaginationManager {
    columns: HashMap<StageId, PagedColumn>,
    page_size: usize,
}

impl PaginationManager {
    pub fn new(page_size: usize) -> Self {
        Self {
            columns: HashMap::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Create the column's state on first use
    pub fn ensure(&mut self, stage_id: &StageId) -> &mut PagedColumn {
        self.columns.entry(stage_id.clone()).or_default()
    }

    pub fn column(&self, stage_id: &StageId) -> Option<&PagedColumn> {
        self.columns.get(stage_id)
    }

    pub(crate) fn column_mut(&mut self, stage_id: &StageId) -> Option<&mut PagedColumn> {
        self.columns.get_mut(stage_id)
    }

    pub fn state(&self, stage_id: &StageId) -> Option<&ColumnPagination> {
        self.column(stage_id).map(PagedColumn::state)
    }

    pub fn deals(&self, stage_id: &StageId) -> &[Deal] {
        self.column(stage_id)
            .map(PagedColumn::deals)
            .unwrap_or_default()
    }

    pub fn contains(&self, stage_id: &StageId) -> bool {
        self.columns.contains_key(stage_id)
    }

    pub fn reset(&mut self, stage_id: &StageId) {
        if let Some(column) = self.columns.get_mut(stage_id) {
            column.reset();
        }
    }

    pub fn reset_all(&mut self) {
        for column in self.columns.values_mut() {
            column.reset();
        }
    }

    /// Discard a column's state
    pub fn remove(&mut self, stage_id: &StageId) -> Option<PagedColumn> {
        self.columns.remove(stage_id)
    }

    /// Keep only the listed columns
    pub fn retain(&mut self, stage_ids: &[StageId]) {
        self.columns.retain(|id, _| stage_ids.contains(id));
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn begin_load(&mut self, stage_id: &StageId) -> Result<Option<PageTicket>> {
        let page_size = self.page_size;
        let column = self
            .columns
            .get_mut(stage_id)
            .ok_or_else(|| DealboardError::StageNotFound(stage_id.clone()))?;
        Ok(column.begin_load(Some(stage_id.clone()), page_size))
    }

    /// Apply a response. Responses for columns that no longer exist are stale.
    pub fn complete_load(
        &mut self,
        ticket: &PageTicket,
        result: Result<DealPage>,
    ) -> Result<PageOutcome> {
        let column = ticket
            .stage_id
            .as_ref()
            .and_then(|id| self.columns.get_mut(id));
        match column {
            Some(column) => column.complete_load(ticket, result),
            None => Ok(PageOutcome::Stale),
        }
    }

    /// Find the column currently holding a deal
    pub fn locate(&self, deal_id: &DealId) -> Option<(&StageId, &Deal)> {
        self.columns.iter().find_map(|(stage_id, column)| {
            column
                .position(deal_id)
                .map(|index| (stage_id, &column.deals[index]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkspaceId;

    fn deal(id: &str) -> Deal {
        Deal {
            id: DealId::new(id),
            title: format!("Deal {id}"),
            customer_name: String::new(),
            deal_value: 100.0,
            last_modified_date: None,
            calls_count: 0,
            notes_count: 0,
            reminders_count: 0,
            attachments_count: 0,
            tags: vec![],
            assignees: vec![],
            stage_id: StageId::new("new"),
            workspace_id: WorkspaceId::new("ws"),
        }
    }

    fn page(ids: &[&str], total: usize) -> DealPage {
        DealPage {
            items: ids.iter().map(|id| deal(id)).collect(),
            total,
        }
    }

    fn assert_invariants(state: &ColumnPagination) {
        assert!(state.loaded_items <= state.total_items || state.initial_loading);
        if !state.initial_loading {
            assert_eq!(state.has_more, state.loaded_items < state.total_items);
        }
    }

    #[test]
    fn test_new_column_is_empty() {
        let column = PagedColumn::new();
        let state = column.state();
        assert_eq!(state.phase(), ColumnPhase::Empty);
        assert!(state.has_more);
        assert!(state.initial_loading);
        assert_eq!(state.loaded_items, 0);
    }

    #[test]
    fn test_first_page_clears_initial_loading() {
        let mut column = PagedColumn::new();
        let ticket = column.begin_load(None, 5).unwrap();
        assert_eq!(column.state().phase(), ColumnPhase::InitialLoading);

        let outcome = column
            .complete_load(&ticket, Ok(page(&["a", "b", "c", "d", "e"], 12)))
            .unwrap();
        assert_eq!(outcome, PageOutcome::Appended(5));

        let state = column.state();
        assert_eq!(state.offset, 5);
        assert_eq!(state.loaded_items, 5);
        assert_eq!(state.total_items, 12);
        assert!(state.has_more);
        assert!(!state.is_loading);
        assert!(!state.initial_loading);
        assert_invariants(state);
    }

    #[test]
    fn test_begin_load_is_noop_while_loading() {
        let mut column = PagedColumn::new();
        let first = column.begin_load(None, 5);
        assert!(first.is_some());
        assert!(column.begin_load(None, 5).is_none());
        assert_eq!(column.state().offset, 0);
    }

    #[test]
    fn test_exhausted_column_does_not_load() {
        let mut column = PagedColumn::new();
        let ticket = column.begin_load(None, 5).unwrap();
        column.complete_load(&ticket, Ok(page(&["a", "b"], 2))).unwrap();
        assert_eq!(column.state().phase(), ColumnPhase::Loaded { has_more: false });
        assert!(column.begin_load(None, 5).is_none());
    }

    #[test]
    fn test_pages_append_in_order() {
        let mut column = PagedColumn::new();
        let t1 = column.begin_load(None, 2).unwrap();
        column.complete_load(&t1, Ok(page(&["a", "b"], 3))).unwrap();
        let t2 = column.begin_load(None, 2).unwrap();
        assert_eq!(t2.offset, 2);
        column.complete_load(&t2, Ok(page(&["c"], 3))).unwrap();

        let ids: Vec<_> = column.deals().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(!column.state().has_more);
        assert_invariants(column.state());
    }

    #[test]
    fn test_duplicate_deals_are_not_appended_twice() {
        let mut column = PagedColumn::new();
        let t1 = column.begin_load(None, 2).unwrap();
        column.complete_load(&t1, Ok(page(&["a", "b"], 4))).unwrap();
        let t2 = column.begin_load(None, 2).unwrap();
        let outcome = column.complete_load(&t2, Ok(page(&["b", "c"], 4))).unwrap();

        assert_eq!(outcome, PageOutcome::Appended(1));
        assert_eq!(column.state().loaded_items, 3);
        assert_invariants(column.state());
    }

    #[test]
    fn test_empty_page_exhausts_column() {
        let mut column = PagedColumn::new();
        let t1 = column.begin_load(None, 2).unwrap();
        column.complete_load(&t1, Ok(page(&["a", "b"], 5))).unwrap();
        let t2 = column.begin_load(None, 2).unwrap();
        column.complete_load(&t2, Ok(page(&[], 5))).unwrap();

        assert_eq!(column.state().total_items, 2);
        assert!(!column.state().has_more);
    }

    #[test]
    fn test_failure_keeps_has_more_and_records_error() {
        let mut column = PagedColumn::new();
        let t1 = column.begin_load(None, 2).unwrap();
        column.complete_load(&t1, Ok(page(&["a", "b"], 5))).unwrap();
        let t2 = column.begin_load(None, 2).unwrap();
        let result = column.complete_load(&t2, Err(DealboardError::Api("boom".into())));

        assert!(matches!(result, Err(DealboardError::PageFetch(_))));
        let state = column.state();
        assert!(!state.is_loading);
        assert!(state.has_more);
        assert_eq!(state.offset, 2);
        assert!(state.last_error.as_deref().unwrap().contains("boom"));

        let retry = column.begin_load(None, 2).unwrap();
        assert_eq!(retry.offset, 2);
        assert!(column.state().last_error.is_none());
    }

    #[test]
    fn test_failed_first_load_stays_initial() {
        let mut column = PagedColumn::new();
        let ticket = column.begin_load(None, 2).unwrap();
        let _ = column.complete_load(&ticket, Err(DealboardError::Api("down".into())));
        assert_eq!(column.state().phase(), ColumnPhase::Empty);
        assert!(column.state().initial_loading);
    }

    #[test]
    fn test_reset_restores_empty_state() {
        let mut column = PagedColumn::new();
        let ticket = column.begin_load(None, 3).unwrap();
        column.complete_load(&ticket, Ok(page(&["a", "b", "c"], 3))).unwrap();
        column.reset();

        let state = column.state();
        assert!(state.initial_loading);
        assert!(state.has_more);
        assert_eq!(state.loaded_items, 0);
        assert_eq!(state.offset, 0);
        assert!(column.deals().is_empty());
    }

    #[test]
    fn test_response_after_reset_is_stale() {
        let mut column = PagedColumn::new();
        let old = column.begin_load(None, 3).unwrap();
        column.reset();
        let fresh = column.begin_load(None, 3).unwrap();

        let outcome = column.complete_load(&old, Ok(page(&["x"], 1))).unwrap();
        assert_eq!(outcome, PageOutcome::Stale);
        assert!(column.deals().is_empty());
        assert!(column.state().is_loading);

        column.complete_load(&fresh, Ok(page(&["a"], 1))).unwrap();
        assert_eq!(column.deals()[0].id.as_str(), "a");
    }

    #[test]
    fn test_take_and_put_adjust_counters() {
        let mut column = PagedColumn::new();
        let ticket = column.begin_load(None, 3).unwrap();
        column.complete_load(&ticket, Ok(page(&["a", "b"], 6))).unwrap();

        let (index, deal) = column.take(&DealId::new("a")).unwrap();
        assert_eq!(index, 0);
        assert_eq!(column.state().loaded_items, 1);
        assert_eq!(column.state().total_items, 5);
        assert_invariants(column.state());

        column.put(10, deal);
        assert_eq!(column.deals()[1].id.as_str(), "a");
        assert_eq!(column.state().total_items, 6);
        assert_invariants(column.state());
    }

    #[test]
    fn test_take_and_put_shift_offset() {
        let mut column = PagedColumn::new();
        let ticket = column.begin_load(None, 2).unwrap();
        column.complete_load(&ticket, Ok(page(&["a", "b"], 6))).unwrap();
        assert_eq!(column.state().offset, 2);

        column.take(&DealId::new("a")).unwrap();
        assert_eq!(column.state().offset, 1);
        assert_eq!(column.begin_load(None, 2).unwrap().offset, 1);
    }

    #[test]
    fn test_put_during_in_flight_page_shifts_next_offset() {
        let mut column = PagedColumn::new();
        let t1 = column.begin_load(None, 2).unwrap();
        column.complete_load(&t1, Ok(page(&["a", "b"], 6))).unwrap();

        let t2 = column.begin_load(None, 2).unwrap();
        column.put(0, deal("x"));
        column.complete_load(&t2, Ok(page(&["c", "d"], 7))).unwrap();
        assert_eq!(column.state().offset, 5);
        assert_eq!(column.state().loaded_items, 5);
        assert_invariants(column.state());
    }

    #[test]
    fn test_put_into_unloaded_column_keeps_offset() {
        let mut column = PagedColumn::new();
        column.put(0, deal("x"));
        assert_eq!(column.state().offset, 0);
        assert_eq!(column.begin_load(None, 2).unwrap().offset, 0);
    }

    #[test]
    fn test_manager_columns_are_independent() {
        let mut manager = PaginationManager::new(5);
        let new = StageId::new("new");
        let won = StageId::new("won");
        manager.ensure(&new);
        manager.ensure(&won);

        let t_new = manager.begin_load(&new).unwrap().unwrap();
        let t_won = manager.begin_load(&won).unwrap().unwrap();
        assert!(manager.begin_load(&new).unwrap().is_none());

        manager.complete_load(&t_won, Ok(page(&["w1"], 1))).unwrap();
        assert!(manager.state(&new).unwrap().is_loading);
        assert!(!manager.state(&won).unwrap().is_loading);

        manager.complete_load(&t_new, Ok(page(&["n1"], 1))).unwrap();
        assert_eq!(manager.locate(&DealId::new("n1")).unwrap().0, &new);
    }

    #[test]
    fn test_manager_unknown_column() {
        let mut manager = PaginationManager::new(5);
        assert!(matches!(
            manager.begin_load(&StageId::new("ghost")),
            Err(DealboardError::StageNotFound(_))
        ));
    }

    #[test]
    fn test_manager_removed_column_response_is_stale() {
        let mut manager = PaginationManager::new(5);
        let lost = StageId::new("lost");
        manager.ensure(&lost);
        let ticket = manager.begin_load(&lost).unwrap().unwrap();
        manager.remove(&lost);
        assert_eq!(
            manager.complete_load(&ticket, Ok(page(&["a"], 1))).unwrap(),
            PageOutcome::Stale
        );
    }
}
