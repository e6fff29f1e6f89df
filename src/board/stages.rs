//! Stage edit mode.
//!
//! Stages are renamed, reordered, created and deleted only while the board
//! is in edit mode, and deals cannot be dragged meanwhile. Every stage
//! mutation waits for the server before the board changes.

use std::collections::HashSet;

use crate::error::{DealboardError, Result};
use crate::events::BoardEvent;
use crate::remote::PipelineApi;
use crate::toast::Toast;
use crate::types::{Stage, StageId};

use super::PipelineBoard;

impl PipelineBoard {
    /// Enter edit mode. Rejected while a deal move awaits confirmation.
    pub fn enter_edit_mode(&mut self) -> Result<()> {
        if self.drag.is_in_flight() {
            return Err(DealboardError::DragInFlight);
        }
        self.edit_mode = true;
        Ok(())
    }

    pub fn exit_edit_mode(&mut self) {
        self.edit_mode = false;
    }

    fn require_edit_mode(&self) -> Result<()> {
        if self.edit_mode {
            Ok(())
        } else {
            Err(DealboardError::NotInEditMode)
        }
    }

    fn require_stage(&self, stage_id: &StageId) -> Result<()> {
        if self.stage(stage_id).is_some() {
            Ok(())
        } else {
            Err(DealboardError::StageNotFound(stage_id.clone()))
        }
    }

    fn remote_failed(&mut self, what: &str, error: DealboardError) -> DealboardError {
        tracing::warn!("{what} failed: {error}");
        self.toast = Some(Toast::error(format!("Failed to {what}: {error}")));
        error
    }

    pub async fn rename_stage<A: PipelineApi>(
        &mut self,
        api: &A,
        stage_id: &StageId,
        title: &str,
    ) -> Result<()> {
        self.require_edit_mode()?;
        self.require_stage(stage_id)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(DealboardError::EmptyStageTitle);
        }

        if let Err(e) = api.rename_stage(stage_id, title).await {
            return Err(self.remote_failed("rename stage", e));
        }
        if let Some(stage) = self.stages.iter_mut().find(|s| &s.id == stage_id) {
            stage.title = title.to_string();
        }
        tracing::info!(stage = %stage_id, title, "stage renamed");
        Ok(())
    }

    /// Persist a new stage order. `order` must list every stage exactly once.
    pub async fn reorder_stages<A: PipelineApi>(
        &mut self,
        api: &A,
        order: Vec<StageId>,
    ) -> Result<()> {
        self.require_edit_mode()?;
        let current: HashSet<&StageId> = self.stages.iter().map(|s| &s.id).collect();
        let requested: HashSet<&StageId> = order.iter().collect();
        if order.len() != self.stages.len() || requested != current {
            return Err(DealboardError::InvalidStageOrder);
        }

        if let Err(e) = api.reorder_stages(&self.workspace_id, &order).await {
            return Err(self.remote_failed("reorder stages", e));
        }

        let mut reordered: Vec<Stage> = Vec::with_capacity(order.len());
        for (index, id) in order.iter().enumerate() {
            if let Some(position) = self.stages.iter().position(|s| &s.id == id) {
                let mut stage = self.stages.swap_remove(position);
                stage.index = index;
                reordered.push(stage);
            }
        }
        self.stages = reordered;
        tracing::info!(workspace = %self.workspace_id, "stages reordered");
        self.emit(BoardEvent::StageReordered(order));
        Ok(())
    }

    /// Delete a stage and discard its column state
    pub async fn delete_stage<A: PipelineApi>(&mut self, api: &A, stage_id: &StageId) -> Result<()> {
        self.require_edit_mode()?;
        self.require_stage(stage_id)?;

        if let Err(e) = api.delete_stage(stage_id).await {
            return Err(self.remote_failed("delete stage", e));
        }
        self.stages.retain(|s| &s.id != stage_id);
        for (index, stage) in self.stages.iter_mut().enumerate() {
            stage.index = index;
        }
        self.columns.remove(stage_id);
        self.scroll.rearm(stage_id);
        tracing::info!(stage = %stage_id, "stage deleted");
        Ok(())
    }

    /// Create a stage at the end of the pipeline
    pub async fn create_stage<A: PipelineApi>(&mut self, api: &A, title: &str) -> Result<StageId> {
        self.require_edit_mode()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(DealboardError::EmptyStageTitle);
        }

        let mut stage = match api.create_stage(&self.workspace_id, title).await {
            Ok(stage) => stage,
            Err(e) => return Err(self.remote_failed("create stage", e)),
        };
        stage.index = self.stages.len();
        let id = stage.id.clone();
        self.columns.ensure(&id);
        self.stages.push(stage);
        tracing::info!(stage = %id, "stage created");
        Ok(id)
    }
}
