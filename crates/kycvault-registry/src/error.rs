use kycvault_core::{Address, CoreError};

use crate::store::StoreError;

/// Registry operation errors.
///
/// Absent records, missing consent and fingerprint mismatches are never
/// errors; they surface as `false` or zero values from queries.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("caller {caller} is not the issuer of the record held by {holder}")]
    Unauthorized { caller: Address, holder: Address },

    #[error("issuer {0} is not allowed to issue credentials")]
    IssuerNotAllowed(Address),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
