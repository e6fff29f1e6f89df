use thiserror::Error;

use crate::types::{DealId, StageId};

#[derive(Error, Debug)]
pub enum DealboardError {
    #[error("stage '{0}' not found")]
    StageNotFound(StageId),

    #[error("deal '{0}' not found")]
    DealNotFound(DealId),

    // Filter rejections (the previous filter stays active)
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("unknown date preset '{0}'")]
    UnknownPreset(String),

    // Board protocol rejections
    #[error("another deal move is still waiting for confirmation")]
    DragInFlight,

    #[error("deals cannot be moved while stages are being edited")]
    EditModeActive,

    #[error("stage editing requires edit mode")]
    NotInEditMode,

    #[error("stage '{stage}' is full ({limit} deals)")]
    StageAtCapacity { stage: StageId, limit: usize },

    #[error("stage order must list every stage exactly once")]
    InvalidStageOrder,

    #[error("stage title cannot be empty")]
    EmptyStageTitle,

    // Batch operations
    #[error("no deals selected")]
    EmptySelection,

    #[error("a batch operation is already running")]
    BatchInFlight,

    #[error("no batch operation is awaiting confirmation")]
    NoPendingConfirmation,

    #[error("batch {action} failed: {message}")]
    BatchFailed { action: String, message: String },

    #[error("batch {action} failed for {} of the selected deals", failed.len())]
    PartialBatchFailure { action: String, failed: Vec<DealId> },

    // Remote failures caught at the board
    #[error("failed to load deals: {0}")]
    PageFetch(String),

    #[error("failed to move deal '{deal}': {message}")]
    StageTransition { deal: DealId, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("date error: {0}")]
    Date(#[from] jiff::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DealboardError>;
