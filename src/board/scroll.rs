//! Infinite-scroll trigger.
//!
//! The rendering layer reports visibility changes of cards. When the last
//! loaded card of a column becomes visible and the column can load more, the
//! trigger fires once. The column's `is_loading` flag gates re-entry while
//! the page is in flight. The board calls [`ScrollTrigger::rearm`] for the
//! column once a page is applied, even one that appended nothing. A failed
//! page does not re-fire for the same card until an explicit retry rearms
//! the column.

use std::collections::HashMap;

use crate::types::{DealId, StageId};

use super::pagination::PagedColumn;

/// A card's visibility as reported by the rendering layer
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEvent {
    pub stage_id: StageId,
    pub card_id: DealId,
    /// Visible fraction of the card, 0.0 to 1.0
    pub intersection_ratio: f32,
}

#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    threshold: f32,
    /// Last card per column that already fired
    fired: HashMap<StageId, DealId>,
}

impl ScrollTrigger {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            fired: HashMap::new(),
        }
    }

    /// Whether this visibility change should load the column's next page
    pub fn observe(&mut self, event: &VisibilityEvent, column: &PagedColumn) -> bool {
        if event.intersection_ratio <= 0.0 || event.intersection_ratio < self.threshold {
            return false;
        }
        let Some(last) = column.deals().last() else {
            return false;
        };
        if last.id != event.card_id || !column.state().can_load_more() {
            return false;
        }
        if self.fired.get(&event.stage_id) == Some(&event.card_id) {
            return false;
        }

        self.fired
            .insert(event.stage_id.clone(), event.card_id.clone());
        true
    }

    pub fn rearm(&mut self, stage_id: &StageId) {
        self.fired.remove(stage_id);
    }

    pub fn rearm_all(&mut self) {
        self.fired.clear();
    }
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(0.5)
    }
}
