//! KYC Vault Core: fundamental types, errors, and the credential record
//! state machine shared by every KYC Vault crate.

pub mod call;
pub mod config;
pub mod error;
pub mod event;
pub mod record_state;
pub mod types;

pub use call::{RegistryCall, Submission, VerifyQuery};
pub use config::{IssuancePolicyKind, RegistryConfig};
pub use error::CoreError;
pub use event::{EventFilter, Receipt, RegistryEvent, SequencedEvent};
pub use record_state::{RecordEvent, RecordState, RecordStateMachine};
pub use types::{Address, Caller, CredentialRecord, Fingerprint, RecordView};
