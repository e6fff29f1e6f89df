//! Board view model
//!
//! Render data for the presentation layer, computed from a
//! [`PipelineBoard`] without touching it. Keeping this a pure function makes
//! the column states testable without any rendering framework.

use serde::Serialize;

use crate::search::match_deals;
use crate::types::{Deal, Stage};

use super::PipelineBoard;
use super::pagination::{ColumnPagination, ColumnPhase};

/// Computed view model for the whole board
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardViewModel {
    /// One entry per stage, in board order
    pub columns: Vec<ColumnViewModel>,
    /// Whether the board is in stage edit mode
    pub edit_mode: bool,
    /// Whether the view's filter was explicitly applied
    pub filter_applied: bool,
    /// Sum of stage budgets
    pub total_budget: f64,
    /// Sum of server-reported deal counts
    pub total_deals: usize,
}

/// View model for a single column
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnViewModel {
    /// The stage this column represents
    pub stage: Stage,
    /// Loaded cards in display order
    pub cards: Vec<CardViewModel>,
    /// Pagination cursor of the column
    pub pagination: ColumnPagination,
    /// What to show instead of cards, if the column has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<ColumnEmptyState>,
    /// Whether to render a retry affordance
    pub can_retry: bool,
    /// Whether to render a "loading more" footer
    pub loading_more: bool,
}

/// View model for a single deal card
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardViewModel {
    pub deal: Deal,
    /// Whether the card matches the quick-find query
    pub matched: bool,
    /// Title character positions to highlight
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub title_indices: Vec<usize>,
    /// Moved optimistically and still awaiting server confirmation
    pub pending: bool,
}

/// Placeholder for a column without cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "message")]
pub enum ColumnEmptyState {
    /// First page in flight
    Loading,
    /// Loaded, and there is nothing in the stage
    NoDeals,
    /// The first page failed
    LoadFailed(String),
}

/// Compute render data for every column.
///
/// `quick_find` only marks matching cards; every loaded card is still
/// present in its column.
pub fn compute_board_view_model(board: &PipelineBoard, quick_find: &str) -> BoardViewModel {
    let pending = board.pending_move().map(|p| p.deal_id.clone());
    let query_active = !quick_find.trim().is_empty();

    let columns: Vec<ColumnViewModel> = board
        .stages()
        .iter()
        .map(|stage| {
            let deals = board.deals(&stage.id);
            let pagination = board.pagination(&stage.id).cloned().unwrap_or_default();
            let matches = match_deals(deals, quick_find);

            let cards = deals
                .iter()
                .map(|deal| {
                    let found = matches.iter().find(|m| m.deal_id == deal.id);
                    CardViewModel {
                        deal: deal.clone(),
                        matched: !query_active || found.is_some(),
                        title_indices: found.map(|m| m.title_indices.clone()).unwrap_or_default(),
                        pending: pending.as_ref() == Some(&deal.id),
                    }
                })
                .collect::<Vec<_>>();

            ColumnViewModel {
                empty_state: compute_empty_state(cards.is_empty(), &pagination),
                can_retry: pagination.last_error.is_some() && !pagination.is_loading,
                loading_more: pagination.phase() == ColumnPhase::Loading,
                stage: stage.clone(),
                cards,
                pagination,
            }
        })
        .collect();

    BoardViewModel {
        edit_mode: board.is_edit_mode(),
        filter_applied: board
            .filters()
            .get_current(board.view_key())
            .map(|f| f.is_filter_applied)
            .unwrap_or(false),
        total_budget: board.stages().iter().map(|s| s.budget).sum(),
        total_deals: board.stages().iter().map(|s| s.total_deals).sum(),
        columns,
    }
}

fn compute_empty_state(
    no_cards: bool,
    pagination: &ColumnPagination,
) -> Option<ColumnEmptyState> {
    if !no_cards {
        return None;
    }
    if let Some(error) = &pagination.last_error {
        return Some(ColumnEmptyState::LoadFailed(error.clone()));
    }
    match pagination.phase() {
        ColumnPhase::Loaded { has_more: false } => Some(ColumnEmptyState::NoDeals),
        _ => Some(ColumnEmptyState::Loading),
    }
}
