//! Events the board and lists report to the surrounding application.
//!
//! Delivery goes over a bounded channel. Emitting never blocks and never
//! fails the operation that produced the event: a full or closed channel is
//! logged and the event is dropped.

use tokio::sync::mpsc;

use crate::filter::Filter;
use crate::remote::BatchAction;
use crate::types::{Deal, DealId, StageId};

/// Default capacity of an event channel
pub const CHANNEL_CAPACITY: usize = 100;

/// Something the surrounding application may want to react to
#[derive(Debug, Clone)]
pub enum BoardEvent {
    /// A card was clicked
    DealClicked(Deal),
    /// A column requested its next page
    LoadMore(StageId),
    /// Stages were reordered and the new order was persisted
    StageReordered(Vec<StageId>),
    /// A filter was applied to the view
    FilterApplied(Filter),
    /// A batch action was requested and awaits confirmation
    BatchActionRequested { action: BatchAction, ids: Vec<DealId> },
}

/// Sending half of the event channel
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: mpsc::Sender<BoardEvent>,
}

impl EventChannel {
    /// Create a channel with the given capacity and return both halves
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<BoardEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: BoardEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(?event, "event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("event receiver dropped");
            }
        }
    }
}
