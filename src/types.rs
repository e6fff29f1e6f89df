use serde::{Deserialize, Serialize};

use crate::id_newtype;

id_newtype!(
    /// Identifier of a deal
    DealId
);

id_newtype!(
    /// Identifier of a pipeline stage (column)
    StageId
);

id_newtype!(
    /// Identifier of the workspace that owns a pipeline
    WorkspaceId
);

/// Client-side projection of a deal as returned by the pipeline API.
///
/// Deals are created and updated server-side; the board only holds this
/// projection and writes to it optimistically (currently just `stage_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub deal_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    #[serde(default)]
    pub calls_count: u32,
    #[serde(default)]
    pub notes_count: u32,
    #[serde(default)]
    pub reminders_count: u32,
    #[serde(default)]
    pub attachments_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    pub stage_id: StageId,
    pub workspace_id: WorkspaceId,
}

/// One ordered bucket of deals in a workspace pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    /// Position of the stage on the board
    pub index: usize,
    pub title: String,
    /// Sum of contained deal values
    #[serde(default)]
    pub budget: f64,
    /// Server-reported deal count, independent of what is loaded
    #[serde(default)]
    pub total_deals: usize,
}
