//! The state-store abstraction behind the registry.
//!
//! A store holds current state (records and consent sets) plus the
//! append-only event log. Every state change reaches the store as a
//! [`ChangeSet`] that must be applied all-or-nothing.

use kycvault_core::{
    Address, CredentialRecord, EventFilter, Receipt, RegistryEvent, SequencedEvent,
};

/// State-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("corrupt entry: {0}")]
    Corrupt(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single mutation of current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateWrite {
    /// Overwrite the holder's record.
    PutRecord {
        holder: Address,
        record: CredentialRecord,
    },
    /// Add `verifier` to the holder's consent set. No-op if present.
    AddConsent { holder: Address, verifier: Address },
    /// Remove `verifier` from the holder's consent set. No-op if absent.
    RemoveConsent { holder: Address, verifier: Address },
}

/// State writes plus the one event they emit, committed atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub writes: Vec<StateWrite>,
    pub event: RegistryEvent,
}

impl ChangeSet {
    /// A change set with a single write.
    pub fn single(write: StateWrite, event: RegistryEvent) -> Self {
        Self {
            writes: vec![write],
            event,
        }
    }
}

/// Storage backend for the credential registry.
pub trait RegistryStore: Send + Sync {
    /// The stored record for `holder`, if one was ever issued.
    fn record(&self, holder: &Address) -> Result<Option<CredentialRecord>, StoreError>;

    /// Whether `verifier` is in `holder`'s consent set.
    fn has_consent(&self, holder: &Address, verifier: &Address) -> Result<bool, StoreError>;

    /// All verifiers in `holder`'s consent set, in ascending address order.
    fn consents(&self, holder: &Address) -> Result<Vec<Address>, StoreError>;

    /// Events matching `filter`, in sequence order.
    fn events(&self, filter: &EventFilter) -> Result<Vec<SequencedEvent>, StoreError>;

    /// Sequence number of the most recent commit, or 0 if none.
    fn last_sequence(&self) -> Result<u64, StoreError>;

    /// Apply `changes` atomically, assigning the next sequence number.
    fn commit(&self, changes: ChangeSet) -> Result<Receipt, StoreError>;
}

impl<S: RegistryStore + ?Sized> RegistryStore for std::sync::Arc<S> {
    fn record(&self, holder: &Address) -> Result<Option<CredentialRecord>, StoreError> {
        (**self).record(holder)
    }

    fn has_consent(&self, holder: &Address, verifier: &Address) -> Result<bool, StoreError> {
        (**self).has_consent(holder, verifier)
    }

    fn consents(&self, holder: &Address) -> Result<Vec<Address>, StoreError> {
        (**self).consents(holder)
    }

    fn events(&self, filter: &EventFilter) -> Result<Vec<SequencedEvent>, StoreError> {
        (**self).events(filter)
    }

    fn last_sequence(&self) -> Result<u64, StoreError> {
        (**self).last_sequence()
    }

    fn commit(&self, changes: ChangeSet) -> Result<Receipt, StoreError> {
        (**self).commit(changes)
    }
}
