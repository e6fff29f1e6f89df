//! The deal pipeline board.
//!
//! [`PipelineBoard`] ties the pieces together for one workspace: the ordered
//! stages, one [`PagedColumn`] per stage, the scroll trigger, the drag
//! handler and the view's entry in the shared [`FilterStore`].
//!
//! Remote work is split into a synchronous `begin_*` step that updates local
//! state and returns what has to be sent, and a `complete_*`/`settle_*` step
//! that applies the response. The async helpers (`load_next`, `drop_deal`,
//! ...) simply chain the two around a [`PipelineApi`] call. Remote failures
//! are turned into a [`Toast`] and also returned to the caller; they never
//! leave the board in an inconsistent state.

pub mod drag;
pub mod model;
pub mod pagination;
pub mod scroll;
mod stages;

use std::time::Duration;

use futures::future::join_all;

use crate::config::{BoardConfig, Config, SearchConfig};
use crate::error::{DealboardError, Result};
use crate::events::{BoardEvent, EventChannel};
use crate::filter::{Filter, FilterStore, QueryKey, ViewKey};
use crate::remote::{DealPage, PageRequest, PipelineApi};
use crate::search::SearchDebouncer;
use crate::toast::Toast;
use crate::types::{Deal, DealId, Stage, StageId, WorkspaceId};

pub use drag::{DragHandler, DragResolution, DropEvent, DropOutcome, PendingMove};
pub use model::{
    BoardViewModel, CardViewModel, ColumnEmptyState, ColumnViewModel, compute_board_view_model,
};
pub use pagination::{
    ColumnPagination, ColumnPhase, PageOutcome, PageTicket, PagedColumn, PaginationManager,
};
pub use scroll::{ScrollTrigger, VisibilityEvent};

/// Board tuning taken from the `board` and `search` config sections
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSettings {
    pub page_size: usize,
    pub max_deals_per_stage: Option<usize>,
    pub scroll_threshold: f32,
    pub search_debounce: Duration,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self::from(&BoardConfig::default())
    }
}

impl From<&BoardConfig> for BoardSettings {
    fn from(config: &BoardConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_deals_per_stage: config.max_deals_per_stage,
            scroll_threshold: config.scroll_threshold,
            search_debounce: Duration::from_millis(SearchConfig::default().debounce_ms),
        }
    }
}

impl BoardSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_debounce: Duration::from_millis(config.search.debounce_ms),
            ..Self::from(&config.board)
        }
    }
}

/// A page request issued for a column, with the ticket to complete it
#[derive(Debug, Clone)]
pub struct PendingPage {
    pub ticket: PageTicket,
    pub request: PageRequest,
}

pub struct PipelineBoard {
    workspace_id: WorkspaceId,
    view_key: ViewKey,
    filters: FilterStore,
    stages: Vec<Stage>,
    columns: PaginationManager,
    scroll: ScrollTrigger,
    drag: DragHandler,
    search: SearchDebouncer,
    edit_mode: bool,
    /// Filter key the loaded pages belong to
    query_key: Option<QueryKey>,
    toast: Option<Toast>,
    events: Option<EventChannel>,
}

impl PipelineBoard {
    pub fn new(workspace_id: WorkspaceId, filters: FilterStore, settings: BoardSettings) -> Self {
        Self {
            workspace_id,
            view_key: ViewKey::pipeline(),
            filters,
            stages: Vec::new(),
            columns: PaginationManager::new(settings.page_size),
            scroll: ScrollTrigger::new(settings.scroll_threshold),
            drag: DragHandler::new(settings.max_deals_per_stage),
            search: SearchDebouncer::new(settings.search_debounce),
            edit_mode: false,
            query_key: None,
            toast: None,
            events: None,
        }
    }

    /// Show a different view of the pipeline (e.g. archived deals)
    pub fn with_view(mut self, view_key: ViewKey) -> Self {
        self.view_key = view_key;
        self
    }

    pub fn with_events(mut self, events: EventChannel) -> Self {
        self.events = Some(events);
        self
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn view_key(&self) -> ViewKey {
        self.view_key
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    /// Stages in board order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, stage_id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| &s.id == stage_id)
    }

    pub fn column(&self, stage_id: &StageId) -> Option<&PagedColumn> {
        self.columns.column(stage_id)
    }

    pub fn pagination(&self, stage_id: &StageId) -> Option<&ColumnPagination> {
        self.columns.state(stage_id)
    }

    pub fn deals(&self, stage_id: &StageId) -> &[Deal] {
        self.columns.deals(stage_id)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.drag.in_flight()
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

    /// Replace the stage list, creating state for new columns and
    /// discarding state for columns that are gone.
    pub fn set_stages(&mut self, mut stages: Vec<Stage>) {
        stages.sort_by_key(|s| s.index);
        let ids: Vec<StageId> = stages.iter().map(|s| s.id.clone()).collect();
        self.columns.retain(&ids);
        for id in &ids {
            self.columns.ensure(id);
        }
        self.stages = stages;
    }

    pub async fn load_stages<A: PipelineApi>(&mut self, api: &A) -> Result<()> {
        match api.fetch_stages(&self.workspace_id).await {
            Ok(stages) => {
                tracing::debug!(workspace = %self.workspace_id, count = stages.len(), "stages loaded");
                self.set_stages(stages);
                Ok(())
            }
            Err(e) => {
                self.toast = Some(Toast::error(format!("Failed to load stages: {e}")));
                Err(e)
            }
        }
    }

    /// Switch to another workspace. All stages and columns are dropped.
    pub fn set_workspace(&mut self, workspace_id: WorkspaceId) {
        if workspace_id == self.workspace_id {
            return;
        }
        tracing::debug!(from = %self.workspace_id, to = %workspace_id, "switching workspace");
        self.workspace_id = workspace_id;
        self.stages.clear();
        self.columns.clear();
        self.scroll.rearm_all();
        self.query_key = None;
    }

    /// Reset every column if the stored filter changed since the pages
    /// were loaded. Returns whether a reset happened.
    pub fn sync_filter(&mut self) -> Result<bool> {
        let key = self.filters.query_key(self.view_key)?;
        if self.query_key.as_ref() == Some(&key) {
            return Ok(false);
        }
        if self.query_key.is_some() {
            tracing::debug!(view = ?self.view_key, "filter changed, resetting columns");
        }
        self.columns.reset_all();
        self.scroll.rearm_all();
        self.query_key = Some(key);
        Ok(true)
    }

    /// Store a new filter for this view and reset all columns.
    ///
    /// A rejected filter leaves the previous one (and the loaded pages) in
    /// place.
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

    /// Debouncer for the search box. Clones share the latest-keystroke
    /// counter, so each keystroke can settle on its own task.
    pub fn search_debouncer(&self) -> SearchDebouncer {
        self.search.clone()
    }

    /// Apply settled search text on top of the stored filter.
    ///
    /// Returns `false` without resetting anything when the text is unchanged.
    pub fn apply_search(&mut self, text: &str) -> Result<bool> {
        let current = self.filters.get_current(self.view_key)?;
        let Some(filter) = current.with_search(text) else {
            return Ok(false);
        };
        self.apply_filter(filter)?;
        Ok(true)
    }

    /// Debounce one keystroke and apply it if no newer one arrived.
    pub async fn search(&mut self, text: &str) -> Result<bool> {
        let debouncer = self.search.clone();
        match debouncer.settle(text).await {
            Some(text) => self.apply_search(&text),
            None => Ok(false),
        }
    }

    /// Start loading the next page of a column.
    ///
    /// Returns `None` when the column is already loading or exhausted.
    pub fn begin_page(&mut self, stage_id: &StageId) -> Result<Option<PendingPage>> {
        self.sync_filter()?;
        let filter = self.filters.get_current(self.view_key)?;
        let Some(ticket) = self.columns.begin_load(stage_id)? else {
            return Ok(None);
        };
        let request = PageRequest {
            workspace_id: self.workspace_id.clone(),
            stage_id: Some(stage_id.clone()),
            filter: filter.request_body(),
            offset: ticket.offset,
            page_size: ticket.page_size,
            archived: self.view_key.archived,
        };
        self.emit(BoardEvent::LoadMore(stage_id.clone()));
        Ok(Some(PendingPage { ticket, request }))
    }

    /// Apply a page response. Stale responses are dropped silently.
    pub fn complete_page(
        &mut self,
        ticket: &PageTicket,
        result: Result<DealPage>,
    ) -> Result<PageOutcome> {
        let outcome = self.columns.complete_load(ticket, result);
        match &outcome {
            // A page that only repeated loaded deals leaves the same last
            // card, which must be able to fire again
            Ok(PageOutcome::Appended(_)) => {
                if let Some(stage_id) = &ticket.stage_id {
                    self.scroll.rearm(stage_id);
                }
            }
            Ok(_) => {}
            Err(e) => {
                let stage = ticket
                    .stage_id
                    .as_ref()
                    .and_then(|id| self.stage(id))
                    .map_or_else(|| "stage".to_string(), |s| s.title.clone());
                self.toast = Some(Toast::error(format!("{stage}: {e}")));
            }
        }
        outcome
    }

    /// Load the next page of one column
    pub async fn load_next<A: PipelineApi>(
        &mut self,
        api: &A,
        stage_id: &StageId,
    ) -> Result<PageOutcome> {
        let Some(pending) = self.begin_page(stage_id)? else {
            return Ok(PageOutcome::Skipped);
        };
        let result = api.fetch_deals_page(&pending.request).await;
        self.complete_page(&pending.ticket, result)
    }

    /// Load a page for every column that can load one, concurrently.
    ///
    /// Columns fail independently; the first error is returned after every
    /// response has been applied.
    pub async fn load_initial<A: PipelineApi>(&mut self, api: &A) -> Result<()> {
        let mut pending = Vec::new();
        for stage_id in self.stages.iter().map(|s| s.id.clone()).collect::<Vec<_>>() {
            if let Some(page) = self.begin_page(&stage_id)? {
                pending.push(page);
            }
        }

        let responses = join_all(pending.iter().map(|p| api.fetch_deals_page(&p.request))).await;

        let mut first_error = None;
        for (page, response) in pending.iter().zip(responses) {
            if let Err(e) = self.complete_page(&page.ticket, response) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Feed a visibility change from the rendering layer.
    ///
    /// Returns the page to fetch when the change crossed the last card.
    pub fn on_card_visible(&mut self, event: &VisibilityEvent) -> Result<Option<PendingPage>> {
        self.sync_filter()?;
        let Some(column) = self.columns.column(&event.stage_id) else {
            return Ok(None);
        };
        if !self.scroll.observe(event, column) {
            return Ok(None);
        }
        self.begin_page(&event.stage_id)
    }

    pub async fn handle_visibility<A: PipelineApi>(
        &mut self,
        api: &A,
        event: &VisibilityEvent,
    ) -> Result<PageOutcome> {
        let Some(pending) = self.on_card_visible(event)? else {
            return Ok(PageOutcome::Skipped);
        };
        let result = api.fetch_deals_page(&pending.request).await;
        self.complete_page(&pending.ticket, result)
    }

    /// Explicit retry after a failed page load
    pub fn retry(&mut self, stage_id: &StageId) -> Result<Option<PendingPage>> {
        if let Some(column) = self.columns.column_mut(stage_id) {
            column.clear_error();
        }
        self.scroll.rearm(stage_id);
        self.begin_page(stage_id)
    }

    /// Apply a drop locally. Cross-column moves must then be settled with
    /// the remote result through [`PipelineBoard::settle_drop`].
    pub fn begin_drop(&mut self, drop: &DropEvent) -> Result<DropOutcome> {
        if self.edit_mode {
            return Err(DealboardError::EditModeActive);
        }
        match self.drag.begin(drop, &mut self.columns, &mut self.stages) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if matches!(e, DealboardError::StageAtCapacity { .. }) {
                    self.toast = Some(Toast::warning(e.to_string()));
                }
                Err(e)
            }
        }
    }

    pub fn settle_drop(&mut self, result: Result<()>) -> Result<PendingMove> {
        match self.drag.settle(result, &mut self.columns, &mut self.stages) {
            Some(DragResolution::Committed(pending)) => Ok(pending),
            Some(DragResolution::RolledBack { pending, error }) => {
                let error = DealboardError::StageTransition {
                    deal: pending.deal_id,
                    message: error.to_string(),
                };
                self.toast = Some(Toast::error(error.to_string()));
                Err(error)
            }
            None => Err(DealboardError::Other(
                "no deal move is awaiting confirmation".to_string(),
            )),
        }
    }

    /// Drop a deal and issue the remote stage change when needed
    pub async fn drop_deal<A: PipelineApi>(
        &mut self,
        api: &A,
        drop: &DropEvent,
    ) -> Result<DropOutcome> {
        let outcome = self.begin_drop(drop)?;
        if let DropOutcome::Pending(pending) = &outcome {
            let result = api.move_deal_stage(&pending.deal_id, &pending.dest).await;
            self.settle_drop(result)?;
        }
        Ok(outcome)
    }

    pub fn click_deal(&self, deal_id: &DealId) -> Result<()> {
        let (_, deal) = self
            .columns
            .locate(deal_id)
            .ok_or_else(|| DealboardError::DealNotFound(deal_id.clone()))?;
        self.emit(BoardEvent::DealClicked(deal.clone()));
        Ok(())
    }

    /// Render data for every column
    pub fn view_model(&self, quick_find: &str) -> BoardViewModel {
        compute_board_view_model(self, quick_find)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::DatePreset;
    use crate::filter::FilterDraft;
    use jiff::civil::date;

    fn deal(id: &str, stage: &str) -> Deal {
        Deal {
            id: DealId::new(id),
            title: id.to_string(),
            customer_name: String::new(),
            deal_value: 10.0,
            last_modified_date: None,
            calls_count: 0,
            notes_count: 0,
            reminders_count: 0,
            attachments_count: 0,
            tags: vec![],
            assignees: vec![],
            stage_id: StageId::new(stage),
            workspace_id: WorkspaceId::new("ws"),
        }
    }

    fn board() -> PipelineBoard {
        let filters = FilterStore::with_anchor(date(2026, 3, 18));
        let mut board = PipelineBoard::new(
            WorkspaceId::new("ws"),
            filters,
            BoardSettings {
                page_size: 5,
                ..Default::default()
            },
        );
        board.set_stages(vec![
            Stage {
                id: StageId::new("won"),
                index: 1,
                title: "Won".into(),
                budget: 0.0,
                total_deals: 0,
            },
            Stage {
                id: StageId::new("new"),
                index: 0,
                title: "New".into(),
                budget: 0.0,
                total_deals: 0,
            },
        ]);
        board
    }

    #[test]
    fn test_set_stages_orders_by_index() {
        let board = board();
        let ids: Vec<_> = board.stages().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "won"]);
        assert!(board.column(&StageId::new("won")).is_some());
    }

    #[test]
    fn test_unfiltered_request_has_no_predicate() {
        let mut board = board();
        let pending = board.begin_page(&StageId::new("new")).unwrap().unwrap();
        assert!(pending.request.filter.is_none());
        assert_eq!(pending.request.page_size, 5);
        assert_eq!(pending.request.stage_id, Some(StageId::new("new")));
    }

    #[test]
    fn test_apply_filter_resets_and_drops_stale_pages() {
        let mut board = board();
        let new = StageId::new("new");
        let old = board.begin_page(&new).unwrap().unwrap();

        let mut draft = FilterDraft::from_filter(&board.filters().get_current(board.view_key()).unwrap());
        draft.set_preset(DatePreset::Last7Days, date(2026, 3, 18)).unwrap();
        draft.toggle_tag("vip");
        board.apply_filter(draft.into_filter()).unwrap();

        assert!(board.pagination(&new).unwrap().initial_loading);
        assert!(!board.pagination(&new).unwrap().is_loading);

        let fresh = board.begin_page(&new).unwrap().unwrap();
        assert_eq!(
            fresh.request.filter.as_ref().and_then(|f| f.tags.clone()),
            Some(vec!["vip".to_string()])
        );

        let stale = board.complete_page(
            &old.ticket,
            Ok(DealPage {
                items: vec![deal("old", "new")],
                total: 1,
            }),
        );
        assert_eq!(stale.unwrap(), PageOutcome::Stale);
        assert!(board.deals(&new).is_empty());
    }

    #[test]
    fn test_rejected_filter_keeps_pages() {
        let mut board = board();
        let new = StageId::new("new");
        let pending = board.begin_page(&new).unwrap().unwrap();
        board
            .complete_page(
                &pending.ticket,
                Ok(DealPage {
                    items: vec![deal("d1", "new")],
                    total: 3,
                }),
            )
            .unwrap();

        let mut bad = board.filters().get_current(board.view_key()).unwrap();
        std::mem::swap(&mut bad.date_range.from, &mut bad.date_range.to);
        assert!(board.apply_filter(bad).is_err());
        assert!(board.toast().is_some());
        assert_eq!(board.deals(&new).len(), 1);
    }

    #[test]
    fn test_failed_page_sets_error_toast() {
        let mut board = board();
        let new = StageId::new("new");
        let pending = board.begin_page(&new).unwrap().unwrap();
        let result = board.complete_page(&pending.ticket, Err(DealboardError::Api("500".into())));
        assert!(result.is_err());
        let toast = board.take_toast().unwrap();
        assert!(toast.is_error());
        assert!(toast.message.starts_with("New:"));

        let retry = board.retry(&new).unwrap();
        assert!(retry.is_some());
    }

    #[test]
    fn test_drop_rejected_in_edit_mode() {
        let mut board = board();
        board.enter_edit_mode().unwrap();
        let drop = DropEvent {
            deal_id: DealId::new("d1"),
            source: StageId::new("new"),
            dest: StageId::new("won"),
            dest_index: 0,
        };
        assert!(matches!(
            board.begin_drop(&drop),
            Err(DealboardError::EditModeActive)
        ));
    }

    #[test]
    fn test_click_emits_event() {
        let (events, mut rx) = EventChannel::bounded(8);
        let mut board = board().with_events(events);
        let new = StageId::new("new");
        let pending = board.begin_page(&new).unwrap().unwrap();
        board
            .complete_page(
                &pending.ticket,
                Ok(DealPage {
                    items: vec![deal("d1", "new")],
                    total: 1,
                }),
            )
            .unwrap();

        board.click_deal(&DealId::new("d1")).unwrap();
        assert!(matches!(rx.try_recv(), Ok(BoardEvent::LoadMore(_))));
        assert!(matches!(rx.try_recv(), Ok(BoardEvent::DealClicked(d)) if d.id.as_str() == "d1"));
        assert!(matches!(
            board.click_deal(&DealId::new("missing")),
            Err(DealboardError::DealNotFound(_))
        ));
    }

    #[test]
    fn test_switching_workspace_drops_columns() {
        let mut board = board();
        board.set_workspace(WorkspaceId::new("other"));
        assert!(board.stages().is_empty());
        assert!(board.column(&StageId::new("new")).is_none());
    }
}
