//! Batch operations over a selection.
//!
//! A batch goes through a confirmation step: [`BatchCoordinator::request`]
//! opens a [`ConfirmDialogState`] for the current selection, and only
//! [`BatchCoordinator::begin_confirm`] hands the action out for dispatch.
//! One batch runs at a time.

use crate::error::{DealboardError, Result};
use crate::remote::BatchAction;
use crate::types::DealId;

use super::selection::SelectionSet;

/// State for the confirmation dialog
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmDialogState {
    /// Message to display to the user
    pub message: String,
    /// Whether "yes" is the default answer
    pub default_yes: bool,
    pub action: BatchAction,
    /// Ids captured when the dialog opened
    pub ids: Vec<DealId>,
}

impl ConfirmDialogState {
    pub fn for_batch(action: BatchAction, ids: Vec<DealId>) -> Self {
        let subject = if ids.len() == 1 {
            format!("deal '{}'", ids[0])
        } else {
            format!("{} deals", ids.len())
        };
        let message = match &action {
            BatchAction::Archive => format!("Archive {subject}?"),
            BatchAction::Delete => format!("Delete {subject}? This cannot be undone."),
            BatchAction::MoveStage(stage) => format!("Move {subject} to stage '{stage}'?"),
        };
        Self {
            message,
            default_yes: false,
            action,
            ids,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchCoordinator {
    pending: Option<ConfirmDialogState>,
    in_flight: bool,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dialog awaiting an answer, if any
    pub fn pending(&self) -> Option<&ConfirmDialogState> {
        self.pending.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Ask for confirmation of `action` over the current selection
    pub fn request(
        &mut self,
        action: BatchAction,
        selection: &SelectionSet,
    ) -> Result<&ConfirmDialogState> {
        if self.in_flight {
            return Err(DealboardError::BatchInFlight);
        }
        if selection.is_empty() {
            return Err(DealboardError::EmptySelection);
        }
        Ok(self
            .pending
            .insert(ConfirmDialogState::for_batch(action, selection.ids())))
    }

    /// Dismiss the dialog. The selection is left alone.
    pub fn cancel(&mut self) -> Option<ConfirmDialogState> {
        self.pending.take()
    }

    /// Accept the dialog and mark the batch as running
    pub fn begin_confirm(&mut self) -> Result<ConfirmDialogState> {
        if self.in_flight {
            return Err(DealboardError::BatchInFlight);
        }
        let confirmed = self
            .pending
            .take()
            .ok_or(DealboardError::NoPendingConfirmation)?;
        self.in_flight = true;
        Ok(confirmed)
    }

    /// Record the remote result.
    ///
    /// Any failure, including a partial one, fails the whole batch.
    pub fn finish(&mut self, action: &BatchAction, result: Result<()>) -> Result<()> {
        self.in_flight = false;
        match result {
            Ok(()) => Ok(()),
            Err(e @ DealboardError::PartialBatchFailure { .. }) => Err(e),
            Err(e) => Err(DealboardError::BatchFailed {
                action: action.verb().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StageId;

    fn selection(ids: &[&str]) -> SelectionSet {
        let mut selection = SelectionSet::new();
        for id in ids {
            selection.toggle(&DealId::new(*id));
        }
        selection
    }

    #[test]
    fn test_request_requires_selection() {
        let mut batch = BatchCoordinator::new();
        assert!(matches!(
            batch.request(BatchAction::Archive, &SelectionSet::new()),
            Err(DealboardError::EmptySelection)
        ));
    }

    #[test]
    fn test_dialog_messages() {
        let one = ConfirmDialogState::for_batch(BatchAction::Archive, vec![DealId::new("d1")]);
        assert_eq!(one.message, "Archive deal 'd1'?");
        assert!(!one.default_yes);

        let many = ConfirmDialogState::for_batch(
            BatchAction::MoveStage(StageId::new("won")),
            vec![DealId::new("d1"), DealId::new("d2")],
        );
        assert_eq!(many.message, "Move 2 deals to stage 'won'?");
    }

    #[test]
    fn test_confirm_flow() {
        let mut batch = BatchCoordinator::new();
        let selection = selection(&["d1", "d2", "d3"]);
        batch.request(BatchAction::Delete, &selection).unwrap();

        let confirmed = batch.begin_confirm().unwrap();
        assert_eq!(confirmed.ids.len(), 3);
        assert!(batch.is_in_flight());
        assert!(matches!(
            batch.request(BatchAction::Archive, &selection),
            Err(DealboardError::BatchInFlight)
        ));

        batch.finish(&confirmed.action, Ok(())).unwrap();
        assert!(!batch.is_in_flight());
    }

    #[test]
    fn test_confirm_without_request() {
        let mut batch = BatchCoordinator::new();
        assert!(matches!(
            batch.begin_confirm(),
            Err(DealboardError::NoPendingConfirmation)
        ));
    }

    #[test]
    fn test_cancel_drops_dialog() {
        let mut batch = BatchCoordinator::new();
        batch
            .request(BatchAction::Archive, &selection(&["d1"]))
            .unwrap();
        assert!(batch.cancel().is_some());
        assert!(batch.pending().is_none());
    }

    #[test]
    fn test_failures_fail_whole_batch() {
        let mut batch = BatchCoordinator::new();
        let err = batch
            .finish(&BatchAction::Archive, Err(DealboardError::Api("503".into())))
            .unwrap_err();
        assert!(matches!(err, DealboardError::BatchFailed { .. }));

        let partial = batch
            .finish(
                &BatchAction::Delete,
                Err(DealboardError::PartialBatchFailure {
                    action: "delete".into(),
                    failed: vec![DealId::new("d2")],
                }),
            )
            .unwrap_err();
        assert!(matches!(partial, DealboardError::PartialBatchFailure { .. }));
    }
}
