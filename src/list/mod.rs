//! Flat deal list with multi-select and batch operations.
//!
//! Unlike the board, the list never patches rows after a mutation: a
//! successful batch clears the selection and re-queries from the first page.

pub mod batch;
pub mod selection;

use std::time::Duration;

use crate::board::{PageOutcome, PageTicket, PagedColumn, PendingPage};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::events::{BoardEvent, EventChannel};
use crate::filter::{Filter, FilterStore, QueryKey, ViewKey};
use crate::remote::{BatchAction, DealPage, PageRequest, PipelineApi, run_batch};
use crate::search::SearchDebouncer;
use crate::toast::Toast;
use crate::types::{Deal, DealId, WorkspaceId};

pub use batch::{BatchCoordinator, ConfirmDialogState};
pub use selection::SelectionSet;

pub struct DealListView {
    workspace_id: WorkspaceId,
    view_key: ViewKey,
    filters: FilterStore,
    rows: PagedColumn,
    page_size: usize,
    query_key: Option<QueryKey>,
    selection: SelectionSet,
    batch: BatchCoordinator,
    search: SearchDebouncer,
    toast: Option<Toast>,
    events: Option<EventChannel>,
}

impl DealListView {
    pub fn new(workspace_id: WorkspaceId, filters: FilterStore, page_size: usize) -> Self {
        Self {
            workspace_id,
            view_key: ViewKey::pipeline(),
            filters,
            rows: PagedColumn::new(),
            page_size: page_size.max(1),
            query_key: None,
            selection: SelectionSet::new(),
            batch: BatchCoordinator::new(),
            search: SearchDebouncer::from_config(&SearchConfig::default()),
            toast: None,
            events: None,
        }
    }

    pub fn with_view(mut self, view_key: ViewKey) -> Self {
        self.view_key = view_key;
        self
    }

    pub fn with_events(mut self, events: EventChannel) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search = SearchDebouncer::new(delay);
        self
    }

    pub fn view_key(&self) -> ViewKey {
        self.view_key
    }

    pub fn deals(&self) -> &[Deal] {
        self.rows.deals()
    }

    pub fn rows(&self) -> &PagedColumn {
        &self.rows
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn pending_confirmation(&self) -> Option<&ConfirmDialogState> {
        self.batch.pending()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn take_toast(&mut self) -> Option<Toast> {
        self.toast.take()
    }

    fn emit(&self, event: BoardEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    /// Reset the rows if the stored filter changed since they were loaded
    pub fn sync_filter(&mut self) -> Result<bool> {
        let key = self.filters.query_key(self.view_key)?;
        if self.query_key.as_ref() == Some(&key) {
            return Ok(false);
        }
        self.rows.reset();
        self.query_key = Some(key);
        Ok(true)
    }

    pub fn apply_filter(&mut self, filter: Filter) -> Result<()> {
        if let Err(e) = self.filters.apply(self.view_key, filter) {
            self.toast = Some(Toast::warning(e.to_string()));
            return Err(e);
        }
        self.sync_filter()?;
        let applied = self.filters.get_current(self.view_key)?;
        self.emit(BoardEvent::FilterApplied(applied));
        Ok(())
    }

    pub fn clear_filter(&mut self) -> Result<()> {
        self.filters.clear(self.view_key)?;
        self.sync_filter()?;
        Ok(())
    }

    pub fn search_debouncer(&self) -> SearchDebouncer {
        self.search.clone()
    }

    /// Apply settled search text; `false` when it did not change
    pub fn apply_search(&mut self, text: &str) -> Result<bool> {
        let current = self.filters.get_current(self.view_key)?;
        let Some(filter) = current.with_search(text) else {
            return Ok(false);
        };
        self.apply_filter(filter)?;
        Ok(true)
    }

    pub async fn search(&mut self, text: &str) -> Result<bool> {
        let debouncer = self.search.clone();
        match debouncer.settle(text).await {
            Some(text) => self.apply_search(&text),
            None => Ok(false),
        }
    }

    pub fn begin_page(&mut self) -> Result<Option<PendingPage>> {
        self.sync_filter()?;
        let filter = self.filters.get_current(self.view_key)?;
        let Some(ticket) = self.rows.begin_load(None, self.page_size) else {
            return Ok(None);
        };
        let request = PageRequest {
            workspace_id: self.workspace_id.clone(),
            stage_id: None,
            filter: filter.request_body(),
            offset: ticket.offset,
            page_size: ticket.page_size,
            archived: self.view_key.archived,
        };
        Ok(Some(PendingPage { ticket, request }))
    }

    pub fn complete_page(
        &mut self,
        ticket: &PageTicket,
        result: Result<DealPage>,
    ) -> Result<PageOutcome> {
        let outcome = self.rows.complete_load(ticket, result);
        if let Err(e) = &outcome {
            self.toast = Some(Toast::error(e.to_string()));
        }
        outcome
    }

    pub async fn load_next<A: PipelineApi>(&mut self, api: &A) -> Result<PageOutcome> {
        let Some(pending) = self.begin_page()? else {
            return Ok(PageOutcome::Skipped);
        };
        let result = api.fetch_deals_page(&pending.request).await;
        self.complete_page(&pending.ticket, result)
    }

    /// Drop every row and load the first page again
    pub async fn refresh<A: PipelineApi>(&mut self, api: &A) -> Result<PageOutcome> {
        self.rows.reset();
        self.load_next(api).await
    }

    pub fn toggle_select(&mut self, id: &DealId) -> bool {
        self.selection.toggle(id)
    }

    pub fn select_all_visible(&mut self) {
        let visible: Vec<DealId> = self.rows.deals().iter().map(|d| d.id.clone()).collect();
        self.selection.select_all(&visible);
    }

    /// Leave multi-select mode (explicit cancel or navigating away)
    pub fn cancel_selection(&mut self) {
        self.batch.cancel();
        self.selection.exit_multi_select();
    }

    /// Open the confirmation dialog for a batch action
    pub fn request_batch(&mut self, action: BatchAction) -> Result<ConfirmDialogState> {
        let dialog = self.batch.request(action, &self.selection)?.clone();
        self.emit(BoardEvent::BatchActionRequested {
            action: dialog.action.clone(),
            ids: dialog.ids.clone(),
        });
        Ok(dialog)
    }

    /// Dismiss the dialog; the selection is kept
    pub fn cancel_batch(&mut self) -> Option<ConfirmDialogState> {
        self.batch.cancel()
    }

    /// Dispatch the confirmed batch as a single call.
    ///
    /// On success the selection is cleared and the list re-queried. On
    /// failure the selection is kept so the user can retry.
    pub async fn confirm_batch<A: PipelineApi>(&mut self, api: &A) -> Result<()> {
        let confirmed = self.batch.begin_confirm()?;
        tracing::debug!(action = %confirmed.action, count = confirmed.ids.len(), "dispatching batch");
        let result = run_batch(api, &confirmed.action, &confirmed.ids).await;

        if let Err(e) = self.batch.finish(&confirmed.action, result) {
            tracing::warn!(action = %confirmed.action, "batch failed: {e}");
            self.toast = Some(Toast::error(e.to_string()));
            return Err(e);
        }

        tracing::info!(action = %confirmed.action, count = confirmed.ids.len(), "batch applied");
        self.selection.clear();
        self.toast = Some(Toast::success(format!(
            "{} {} deal(s)",
            past_tense(&confirmed.action),
            confirmed.ids.len()
        )));
        // The batch itself succeeded; a failed reload only leaves its own toast
        let _ = self.refresh(api).await;
        Ok(())
    }
}

fn past_tense(action: &BatchAction) -> &'static str {
    match action {
        BatchAction::Archive => "Archived",
        BatchAction::Delete => "Deleted",
        BatchAction::MoveStage(_) => "Moved",
    }
}
