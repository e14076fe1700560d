//! Fixtures shared by the cross-crate tests.

use kycvault_core::{Address, Caller};
use kycvault_crypto::KeyPair;
use kycvault_registry::{CredentialRegistry, MemoryStore};

/// A named account with a fresh key pair.
pub struct Account {
    pub name: &'static str,
    pub keypair: KeyPair,
}

impl Account {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            keypair: KeyPair::generate(),
        }
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// The authenticated caller for this account.
    pub fn caller(&self) -> Caller {
        Caller::new(self.address()).expect("derived addresses are never zero")
    }
}

/// An in-memory registry with a fixed clock.
pub fn memory_registry() -> CredentialRegistry<MemoryStore> {
    CredentialRegistry::new(MemoryStore::new()).with_clock(|| 1_717_171_717)
}
