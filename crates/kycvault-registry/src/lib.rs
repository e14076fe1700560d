//! KYC Vault Registry: the consent-gated credential registry and the
//! state-store abstraction it runs on.

pub mod error;
pub mod memory;
pub mod policy;
pub mod registry;
pub mod store;

pub use error::RegistryError;
pub use memory::MemoryStore;
pub use policy::{policy_from_config, IssuerAllowList, IssuerPolicy, OpenIssuance};
pub use registry::CredentialRegistry;
pub use store::{ChangeSet, RegistryStore, StateWrite, StoreError};
