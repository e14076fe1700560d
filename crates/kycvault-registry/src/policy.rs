use dashmap::DashSet;
use std::sync::Arc;

use kycvault_core::{Address, CoreError, IssuancePolicyKind, RegistryConfig};

/// Decides which callers may act as issuers.
pub trait IssuerPolicy: Send + Sync {
    /// Whether `issuer` may issue credentials.
    fn may_issue(&self, issuer: &Address) -> bool;

    /// The configured policy kind.
    fn kind(&self) -> IssuancePolicyKind;
}

/// Any caller may issue for any holder.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenIssuance;

impl IssuerPolicy for OpenIssuance {
    fn may_issue(&self, _issuer: &Address) -> bool {
        true
    }

    fn kind(&self) -> IssuancePolicyKind {
        IssuancePolicyKind::Open
    }
}

/// Only listed issuers may issue. The list can change at runtime.
#[derive(Debug, Default)]
pub struct IssuerAllowList {
    issuers: DashSet<Address>,
}

impl IssuerAllowList {
    /// Create an allow-list from the given issuers.
    pub fn new(issuers: impl IntoIterator<Item = Address>) -> Self {
        let list = Self::default();
        for issuer in issuers {
            list.add(issuer);
        }
        list
    }

    /// Admit an issuer. Returns false if it was already listed.
    pub fn add(&self, issuer: Address) -> bool {
        self.issuers.insert(issuer)
    }

    /// Remove an issuer. Returns false if it was not listed.
    pub fn remove(&self, issuer: &Address) -> bool {
        self.issuers.remove(issuer).is_some()
    }

    /// Whether an issuer is listed.
    pub fn contains(&self, issuer: &Address) -> bool {
        self.issuers.contains(issuer)
    }

    /// Number of listed issuers.
    pub fn len(&self) -> usize {
        self.issuers.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.issuers.is_empty()
    }
}

impl IssuerPolicy for IssuerAllowList {
    fn may_issue(&self, issuer: &Address) -> bool {
        self.contains(issuer)
    }

    fn kind(&self) -> IssuancePolicyKind {
        IssuancePolicyKind::AllowList
    }
}

/// Build the issuer policy described by `config`.
pub fn policy_from_config(config: &RegistryConfig) -> Result<Arc<dyn IssuerPolicy>, CoreError> {
    match config.issuance {
        IssuancePolicyKind::Open => {
            if !config.trusted_issuers.is_empty() {
                tracing::warn!(
                    count = config.trusted_issuers.len(),
                    "trusted_issuers is ignored under open issuance"
                );
            }
            Ok(Arc::new(OpenIssuance))
        }
        IssuancePolicyKind::AllowList => {
            let issuers = config.trusted_issuer_addresses()?;
            if issuers.is_empty() {
                tracing::warn!("allow-list issuance configured with no trusted issuers");
            }
            Ok(Arc::new(IssuerAllowList::new(issuers)))
        }
    }
}
