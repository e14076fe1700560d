use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::Address;

/// Who may act as an issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuancePolicyKind {
    /// Any caller may issue a credential for any holder.
    #[default]
    Open,
    /// Only addresses listed in `trusted_issuers` may issue.
    AllowList,
}

impl fmt::Display for IssuancePolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::AllowList => write!(f, "allow_list"),
        }
    }
}

/// Registry behavior settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Issuer admission policy.
    #[serde(default)]
    pub issuance: IssuancePolicyKind,
    /// Issuer addresses admitted under the allow-list policy.
    #[serde(default)]
    pub trusted_issuers: Vec<String>,
}

impl RegistryConfig {
    /// Parse `trusted_issuers` into addresses, rejecting malformed or zero entries.
    pub fn trusted_issuer_addresses(&self) -> Result<Vec<Address>, CoreError> {
        self.trusted_issuers
            .iter()
            .map(|raw| {
                let address: Address = raw.parse()?;
                if address.is_zero() {
                    return Err(CoreError::InvalidAddress(
                        "the zero address cannot be a trusted issuer".into(),
                    ));
                }
                Ok(address)
            })
            .collect()
    }
}
