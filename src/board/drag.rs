//! Drag-and-drop stage transitions.
//!
//! A cross-column drop is applied locally first ([`DragHandler::begin`]) and
//! then confirmed or rolled back once the remote mutation resolves
//! ([`DragHandler::settle`]). Only one move may wait for confirmation at a
//! time. Rollback applies the inverse of the optimistic move rather than
//! restoring a snapshot, so pages that landed in the meantime are kept.

use crate::error::{DealboardError, Result};
use crate::types::{Deal, DealId, Stage, StageId};

use super::pagination::PaginationManager;

/// A completed drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    pub deal_id: DealId,
    pub source: StageId,
    pub dest: StageId,
    /// Requested position in the destination column
    pub dest_index: usize,
}

/// An optimistic move awaiting remote confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub deal_id: DealId,
    pub source: StageId,
    pub dest: StageId,
    pub source_index: usize,
    /// Position the deal was actually inserted at
    pub dest_index: usize,
    pub deal_value: f64,
    /// The deal as it was before the move
    original: Deal,
    source_generation: u64,
    dest_generation: u64,
}

/// Local result of a drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Same position, nothing changed
    NoOp,
    /// Reordered within one column; display only, nothing is sent
    Reordered { from: usize, to: usize },
    /// Moved across columns; the remote mutation must be issued
    Pending(PendingMove),
}

/// How a pending move resolved
#[derive(Debug)]
pub enum DragResolution {
    Committed(PendingMove),
    RolledBack {
        pending: PendingMove,
        error: DealboardError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DragHandler {
    in_flight: Option<PendingMove>,
    stage_limit: Option<usize>,
}

impl DragHandler {
    /// `stage_limit` caps how many deals a stage may hold
    pub fn new(stage_limit: Option<usize>) -> Self {
        Self {
            in_flight: None,
            stage_limit,
        }
    }

    pub fn in_flight(&self) -> Option<&PendingMove> {
        self.in_flight.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply a drop locally.
    ///
    /// Rejected drops leave every column untouched.
    pub fn begin(
        &mut self,
        drop: &DropEvent,
        columns: &mut PaginationManager,
        stages: &mut [Stage],
    ) -> Result<DropOutcome> {
        if self.in_flight.is_some() {
            return Err(DealboardError::DragInFlight);
        }

        let source_column = columns
            .column(&drop.source)
            .ok_or_else(|| DealboardError::StageNotFound(drop.source.clone()))?;
        let source_index = source_column
            .position(&drop.deal_id)
            .ok_or_else(|| DealboardError::DealNotFound(drop.deal_id.clone()))?;

        if drop.source == drop.dest {
            let last = source_column.deals().len() - 1;
            let to = drop.dest_index.min(last);
            if to == source_index {
                return Ok(DropOutcome::NoOp);
            }
            if let Some(column) = columns.column_mut(&drop.source) {
                column.reorder(source_index, to);
            }
            tracing::debug!(deal = %drop.deal_id, from = source_index, to, "reordered within column");
            return Ok(DropOutcome::Reordered {
                from: source_index,
                to,
            });
        }

        let dest_column = columns
            .column(&drop.dest)
            .ok_or_else(|| DealboardError::StageNotFound(drop.dest.clone()))?;
        if let Some(limit) = self.stage_limit {
            let held = stages
                .iter()
                .find(|s| s.id == drop.dest)
                .map_or(0, |s| s.total_deals)
                .max(dest_column.state().loaded_items);
            if held >= limit {
                return Err(DealboardError::StageAtCapacity {
                    stage: drop.dest.clone(),
                    limit,
                });
            }
        }

        let source_generation = source_column.state().generation;
        let dest_generation = dest_column.state().generation;

        let Some((source_index, mut deal)) = columns
            .column_mut(&drop.source)
            .and_then(|column| column.take(&drop.deal_id))
        else {
            return Err(DealboardError::DealNotFound(drop.deal_id.clone()));
        };
        let original = deal.clone();
        deal.stage_id = drop.dest.clone();
        let deal_value = deal.deal_value;
        let dest_index = columns.ensure(&drop.dest).put(drop.dest_index, deal);

        adjust_stage(stages, &drop.source, -1, deal_value);
        adjust_stage(stages, &drop.dest, 1, deal_value);

        let pending = PendingMove {
            deal_id: drop.deal_id.clone(),
            source: drop.source.clone(),
            dest: drop.dest.clone(),
            source_index,
            dest_index,
            deal_value,
            original,
            source_generation,
            dest_generation,
        };
        tracing::debug!(
            deal = %pending.deal_id,
            source = %pending.source,
            dest = %pending.dest,
            "optimistic stage move"
        );
        self.in_flight = Some(pending.clone());
        Ok(DropOutcome::Pending(pending))
    }

    /// Resolve the in-flight move with the remote result.
    ///
    /// Returns `None` when nothing was in flight.
    pub fn settle(
        &mut self,
        result: Result<()>,
        columns: &mut PaginationManager,
        stages: &mut [Stage],
    ) -> Option<DragResolution> {
        let pending = self.in_flight.take()?;
        match result {
            Ok(()) => {
                tracing::info!(deal = %pending.deal_id, stage = %pending.dest, "stage move committed");
                Some(DragResolution::Committed(pending))
            }
            Err(error) => {
                tracing::warn!(deal = %pending.deal_id, "stage move failed, rolling back: {error}");
                rollback(&pending, columns, stages);
                Some(DragResolution::RolledBack { pending, error })
            }
        }
    }
}

/// Undo an optimistic move.
///
/// Columns reset since the move began are left alone; their counters already
/// start from the server again. The source gets the deal back even when the
/// destination column is gone.
fn rollback(pending: &PendingMove, columns: &mut PaginationManager, stages: &mut [Stage]) {
    let mut deal = None;
    if let Some(dest) = columns.column_mut(&pending.dest)
        && dest.state().generation == pending.dest_generation
    {
        deal = dest.take(&pending.deal_id).map(|(_, deal)| deal);
    }

    if let Some(source) = columns.column_mut(&pending.source)
        && source.state().generation == pending.source_generation
        && !source.contains(&pending.deal_id)
    {
        let mut deal = deal.unwrap_or_else(|| pending.original.clone());
        deal.stage_id = pending.source.clone();
        source.put(pending.source_index, deal);
    }

    adjust_stage(stages, &pending.dest, -1, pending.deal_value);
    adjust_stage(stages, &pending.source, 1, pending.deal_value);
}

fn adjust_stage(stages: &mut [Stage], stage_id: &StageId, delta: i8, value: f64) {
    let Some(stage) = stages.iter_mut().find(|s| &s.id == stage_id) else {
        return;
    };
    if delta > 0 {
        stage.total_deals += 1;
        stage.budget += value;
    } else {
        stage.total_deals = stage.total_deals.saturating_sub(1);
        stage.budget -= value;
    }
}
