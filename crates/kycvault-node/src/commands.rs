//! Commands dispatched from the HTTP API to the node command loop.

use tokio::sync::oneshot;

use kycvault_core::{CoreError, Receipt, Submission};
use kycvault_crypto::{CryptoError, SignedEnvelope};
use kycvault_registry::{RegistryError, StoreError};

/// A command sent from the HTTP API to the node's command loop.
pub enum NodeCommand {
    /// Execute a signed state-changing call.
    Submit {
        envelope: SignedEnvelope<Submission>,
        /// The call method the receiving endpoint accepts.
        route: &'static str,
        reply: oneshot::Sender<Result<Receipt, CommandError>>,
    },
}

/// Why a submission was not executed.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    #[error("invalid caller: {0}")]
    InvalidCaller(#[from] CoreError),

    #[error("bad nonce: expected {expected}, got {got}")]
    BadNonce { expected: u64, got: u64 },

    #[error("{method} cannot be submitted to the {route} endpoint")]
    WrongEndpoint {
        method: &'static str,
        route: &'static str,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
