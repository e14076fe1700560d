use crate::record_state::RecordState;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: RecordState, to: RecordState },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
