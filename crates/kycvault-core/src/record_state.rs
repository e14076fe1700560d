use std::fmt;

use crate::error::CoreError;
use crate::types::CredentialRecord;

/// The states of a holder's credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RecordState {
    /// No credential has ever been issued to the holder.
    NoRecord,
    /// The latest issuance is in force.
    Valid,
    /// The issuer revoked the latest issuance. The record stays readable.
    Revoked,
}

impl RecordState {
    /// Derive the state of a stored record.
    pub fn of(record: &CredentialRecord) -> Self {
        if !record.exists() {
            Self::NoRecord
        } else if record.valid {
            Self::Valid
        } else {
            Self::Revoked
        }
    }

    /// Whether a record exists in this state.
    pub fn has_record(&self) -> bool {
        !matches!(self, Self::NoRecord)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecord => write!(f, "NoRecord"),
            Self::Valid => write!(f, "Valid"),
            Self::Revoked => write!(f, "Revoked"),
        }
    }
}

/// Events that trigger record state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEvent {
    /// An issuer issues (or reissues) a credential, overwriting the record.
    Issue,
    /// The recorded issuer revokes the credential.
    Revoke,
}

/// Manages record state transitions.
///
/// Valid transitions:
/// - NoRecord → Valid (Issue)
/// - Valid → Valid (Issue, overwrites)
/// - Revoked → Valid (Issue, overwrites)
/// - Valid → Revoked (Revoke)
/// - Revoked → Revoked (Revoke)
pub struct RecordStateMachine;

impl RecordStateMachine {
    /// Attempt a state transition based on an event.
    /// Returns the new state on success, or an error for invalid transitions.
    pub fn transition(current: RecordState, event: RecordEvent) -> Result<RecordState, CoreError> {
        let new_state = match (current, event) {
            (_, RecordEvent::Issue) => RecordState::Valid,
            (RecordState::Valid | RecordState::Revoked, RecordEvent::Revoke) => {
                RecordState::Revoked
            }
            (RecordState::NoRecord, RecordEvent::Revoke) => {
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: RecordState::Revoked,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "record state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: RecordState, event: RecordEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
