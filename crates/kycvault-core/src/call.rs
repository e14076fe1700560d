use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Fingerprint};

/// A state-changing registry operation, as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RegistryCall {
    /// Bind `fingerprint` to `holder`, with the caller as issuer.
    IssueCredential {
        holder: Address,
        fingerprint: Fingerprint,
    },
    /// Authorize `verifier` to verify the caller's credential.
    GrantConsent { verifier: Address },
    /// Withdraw a previously granted consent.
    RevokeConsent { verifier: Address },
    /// Invalidate `holder`'s record. Only its issuer may do this.
    RevokeCredential { holder: Address },
}

impl RegistryCall {
    /// Name of the operation.
    pub fn method(&self) -> &'static str {
        match self {
            Self::IssueCredential { .. } => "issue_credential",
            Self::GrantConsent { .. } => "grant_consent",
            Self::RevokeConsent { .. } => "revoke_consent",
            Self::RevokeCredential { .. } => "revoke_credential",
        }
    }
}

impl fmt::Display for RegistryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method())
    }
}

/// A call paired with the submitting account's nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Must equal the account's next expected nonce.
    pub nonce: u64,
    pub call: RegistryCall,
}

/// The body of a consent-gated verification query.
///
/// Queries carry no nonce. `issued_at` bounds how long a captured envelope
/// can be replayed by someone other than the verifier who signed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyQuery {
    pub holder: Address,
    pub fingerprint: Fingerprint,
    /// Seconds since the Unix epoch when the verifier signed the query.
    pub issued_at: u64,
}

impl VerifyQuery {
    /// Whether `issued_at` lies within `max_skew_secs` of `now`, either side.
    pub fn is_fresh(&self, now: u64, max_skew_secs: u64) -> bool {
        self.issued_at.abs_diff(now) <= max_skew_secs
    }
}
