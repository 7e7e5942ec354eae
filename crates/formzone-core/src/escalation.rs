//! Escalation state machine
//!
//! A document record is either in the clean dataset or under review. The
//! only moves are escalation (Clean → UnderReview, triggered by marking a
//! comment escalated) and explicit de-escalation (UnderReview → Clean).

use serde::Serialize;
use std::fmt;

/// Dataset a document record currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Active indexing dataset
    Clean,
    /// Review dataset, pending further review
    UnderReview,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Clean => f.write_str("clean"),
            RecordState::UnderReview => f.write_str("under review"),
        }
    }
}

/// Escalation workflow errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscalationError {
    /// Record is in neither dataset
    #[error("document '{0}' is in neither the clean nor the review dataset")]
    Conflict(String),

    /// Move not permitted from the record's current state
    #[error("document cannot move from {from} to {to}")]
    IllegalTransition { from: RecordState, to: RecordState },

    /// Escalation flag set on a record that stays in the clean dataset
    #[error("document '{0}' is clean; escalate it to mark a comment escalated")]
    MarkedWhileClean(String),
}

/// Validate a state transition
///
/// # Errors
///
/// [`EscalationError::IllegalTransition`] for anything but the two moves.
pub fn validate_transition(from: RecordState, to: RecordState) -> Result<(), EscalationError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(EscalationError::IllegalTransition { from, to })
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: RecordState) -> Vec<RecordState> {
    match from {
        RecordState::Clean => vec![RecordState::UnderReview],
        RecordState::UnderReview => vec![RecordState::Clean],
    }
}
