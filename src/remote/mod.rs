//! Remote pipeline API.
//!
//! The board and lists only talk to the server through [`PipelineApi`], so
//! the transport ([`http::HttpPipelineApi`]) can be swapped for an
//! in-memory implementation in tests.

pub mod error;
pub mod http;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::QueryBody;
use crate::types::{Deal, DealId, Stage, StageId, WorkspaceId};

pub use error::ApiError;
pub use http::HttpPipelineApi;

/// One page request against the deal query endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(skip)]
    pub workspace_id: WorkspaceId,
    /// Stage to page through; `None` pages the flat list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<StageId>,
    /// Predicate; `None` requests the unfiltered query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryBody>,
    pub offset: usize,
    #[serde(rename = "limit")]
    pub page_size: usize,
    pub archived: bool,
}

/// A page of deals plus the server-side total for the query
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DealPage {
    pub items: Vec<Deal>,
    pub total: usize,
}

/// A bulk operation over a set of deals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchAction {
    Archive,
    Delete,
    MoveStage(StageId),
}

impl BatchAction {
    /// Short verb used in messages and logs
    pub fn verb(&self) -> &'static str {
        match self {
            BatchAction::Archive => "archive",
            BatchAction::Delete => "delete",
            BatchAction::MoveStage(_) => "move",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchAction::MoveStage(stage) => write!(f, "move to stage {stage}"),
            other => f.write_str(other.verb()),
        }
    }
}

/// Capabilities the pipeline core consumes from the server
pub trait PipelineApi: Send + Sync {
    /// Ordered stages of a workspace
    fn fetch_stages(
        &self,
        workspace_id: &WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Stage>>> + Send;

    /// One page of deals
    fn fetch_deals_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<DealPage>> + Send;

    /// Move a single deal to another stage
    fn move_deal_stage(
        &self,
        deal_id: &DealId,
        stage_id: &StageId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Archive every deal in one call
    fn batch_archive(&self, ids: &[DealId]) -> impl Future<Output = Result<()>> + Send;

    /// Delete every deal in one call
    fn batch_delete(&self, ids: &[DealId]) -> impl Future<Output = Result<()>> + Send;

    /// Move every deal to a stage in one call
    fn batch_move_stage(
        &self,
        ids: &[DealId],
        stage_id: &StageId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn rename_stage(
        &self,
        stage_id: &StageId,
        title: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persist a new stage order for a workspace
    fn reorder_stages(
        &self,
        workspace_id: &WorkspaceId,
        stage_ids: &[StageId],
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_stage(&self, stage_id: &StageId) -> impl Future<Output = Result<()>> + Send;

    /// Create a stage at the end of the workspace pipeline
    fn create_stage(
        &self,
        workspace_id: &WorkspaceId,
        title: &str,
    ) -> impl Future<Output = Result<Stage>> + Send;
}

/// Dispatch a batch action to the matching API call
pub async fn run_batch<A: PipelineApi>(api: &A, action: &BatchAction, ids: &[DealId]) -> Result<()> {
    match action {
        BatchAction::Archive => api.batch_archive(ids).await,
        BatchAction::Delete => api.batch_delete(ids).await,
        BatchAction::MoveStage(stage) => api.batch_move_stage(ids, stage).await,
    }
}
