use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Fingerprint};

/// Audit-log events emitted by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    CredentialIssued {
        holder: Address,
        issuer: Address,
        fingerprint: Fingerprint,
        issued_at: u64,
    },
    ConsentGranted {
        holder: Address,
        verifier: Address,
    },
    ConsentRevoked {
        holder: Address,
        verifier: Address,
    },
    CredentialRevoked {
        holder: Address,
        issuer: Address,
    },
}

impl RegistryEvent {
    /// Short name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CredentialIssued { .. } => "CredentialIssued",
            Self::ConsentGranted { .. } => "ConsentGranted",
            Self::ConsentRevoked { .. } => "ConsentRevoked",
            Self::CredentialRevoked { .. } => "CredentialRevoked",
        }
    }

    /// The holder the event concerns.
    pub fn holder(&self) -> Address {
        match self {
            Self::CredentialIssued { holder, .. }
            | Self::ConsentGranted { holder, .. }
            | Self::ConsentRevoked { holder, .. }
            | Self::CredentialRevoked { holder, .. } => *holder,
        }
    }

    /// The indexed addresses of the event (holder first).
    pub fn indexed(&self) -> [Address; 2] {
        match self {
            Self::CredentialIssued { holder, issuer, .. }
            | Self::CredentialRevoked { holder, issuer } => [*holder, *issuer],
            Self::ConsentGranted { holder, verifier }
            | Self::ConsentRevoked { holder, verifier } => [*holder, *verifier],
        }
    }

    /// Whether `address` appears in any indexed field.
    pub fn involves(&self, address: &Address) -> bool {
        self.indexed().contains(address)
    }
}

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialIssued {
                holder,
                issuer,
                fingerprint,
                issued_at,
            } => write!(
                f,
                "CredentialIssued(holder={}, issuer={}, fingerprint={}, issued_at={})",
                holder, issuer, fingerprint, issued_at
            ),
            Self::ConsentGranted { holder, verifier } => {
                write!(f, "ConsentGranted(holder={}, verifier={})", holder, verifier)
            }
            Self::ConsentRevoked { holder, verifier } => {
                write!(f, "ConsentRevoked(holder={}, verifier={})", holder, verifier)
            }
            Self::CredentialRevoked { holder, issuer } => {
                write!(f, "CredentialRevoked(holder={}, issuer={})", holder, issuer)
            }
        }
    }
}

/// An event together with its position in the registry's total order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// 1-based, gap-free position of the committing operation.
    pub sequence: u64,
    pub event: RegistryEvent,
}

/// The result of a committed state-changing operation.
pub type Receipt = SequencedEvent;

/// Selects a slice of the event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only events involving this address (holder, issuer or verifier).
    #[serde(default)]
    pub address: Option<Address>,
    /// Only events with `sequence >= from_sequence`.
    #[serde(default)]
    pub from_sequence: u64,
    /// Maximum number of events to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl EventFilter {
    /// A filter matching every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to events involving `address`.
    pub fn involving(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Start at `sequence`.
    pub fn starting_at(mut self, sequence: u64) -> Self {
        self.from_sequence = sequence;
        self
    }

    /// Return at most `limit` events.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an event passes the address and sequence predicates.
    /// The limit is applied by the caller.
    pub fn matches(&self, event: &SequencedEvent) -> bool {
        event.sequence >= self.from_sequence
            && self
                .address
                .map_or(true, |address| event.event.involves(&address))
    }
}
