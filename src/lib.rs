pub mod macros;

pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod date_range;
pub mod error;
pub mod events;
pub mod filter;
pub mod list;
pub mod remote;
pub mod search;
pub mod toast;
pub mod types;

pub use board::{BoardSettings, PipelineBoard};
pub use config::Config;
pub use date_range::{DatePreset, DateRange};
pub use error::{DealboardError, Result};
pub use filter::{Filter, FilterStore, ViewKey};
pub use list::DealListView;
pub use remote::{BatchAction, DealPage, HttpPipelineApi, PageRequest, PipelineApi};
pub use types::{Deal, DealId, Stage, StageId, WorkspaceId};
