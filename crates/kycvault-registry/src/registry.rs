use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kycvault_core::{
    Address, Caller, CredentialRecord, EventFilter, Fingerprint, IssuancePolicyKind, Receipt,
    RecordEvent, RecordState, RecordStateMachine, RecordView, RegistryCall, RegistryEvent,
    SequencedEvent,
};

use crate::error::RegistryError;
use crate::policy::{IssuerPolicy, OpenIssuance};
use crate::store::{ChangeSet, RegistryStore, StateWrite};

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// The consent-gated credential registry.
///
/// State-changing operations are serialized through a write gate and each
/// commits as a single [`ChangeSet`]; a rejected operation leaves the store
/// untouched. Queries share the read side of the gate and see a consistent
/// snapshot.
pub struct CredentialRegistry<S> {
    store: S,
    policy: Arc<dyn IssuerPolicy>,
    clock: Clock,
    gate: RwLock<()>,
}

impl<S: RegistryStore> CredentialRegistry<S> {
    /// Create a registry with open issuance.
    pub fn new(store: S) -> Self {
        Self::with_policy(store, Arc::new(OpenIssuance))
    }

    /// Create a registry with the given issuer policy.
    pub fn with_policy(store: S, policy: Arc<dyn IssuerPolicy>) -> Self {
        Self {
            store,
            policy,
            clock: Box::new(unix_now),
            gate: RwLock::new(()),
        }
    }

    /// Replace the timestamp source (seconds since the Unix epoch).
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active issuer policy kind.
    pub fn issuance_policy(&self) -> IssuancePolicyKind {
        self.policy.kind()
    }

    fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn stored_record(&self, holder: &Address) -> Result<CredentialRecord, RegistryError> {
        Ok(self.store.record(holder)?.unwrap_or_default())
    }

    /// Dispatch a submitted call on behalf of `caller`.
    pub fn execute(&self, caller: &Caller, call: &RegistryCall) -> Result<Receipt, RegistryError> {
        match *call {
            RegistryCall::IssueCredential {
                holder,
                fingerprint,
            } => self.issue_credential(caller, holder, fingerprint),
            RegistryCall::GrantConsent { verifier } => self.grant_consent(caller, verifier),
            RegistryCall::RevokeConsent { verifier } => self.revoke_consent(caller, verifier),
            RegistryCall::RevokeCredential { holder } => self.revoke_credential(caller, holder),
        }
    }

    /// Bind `fingerprint` to `holder` with the caller as issuer, overwriting
    /// any previous record.
    pub fn issue_credential(
        &self,
        caller: &Caller,
        holder: Address,
        fingerprint: Fingerprint,
    ) -> Result<Receipt, RegistryError> {
        if holder.is_zero() {
            return Err(RegistryError::InvalidInput(
                "holder must be a non-zero address".into(),
            ));
        }
        if fingerprint.is_zero() {
            return Err(RegistryError::InvalidInput(
                "fingerprint must not be zero".into(),
            ));
        }
        let issuer = caller.address();

        let _gate = self.write_gate();
        if !self.policy.may_issue(&issuer) {
            tracing::warn!(%issuer, %holder, "issuance rejected by issuer policy");
            return Err(RegistryError::IssuerNotAllowed(issuer));
        }
        let current = self.stored_record(&holder)?;
        RecordStateMachine::transition(RecordState::of(&current), RecordEvent::Issue)?;

        let issued_at = (self.clock)();
        let record = CredentialRecord {
            issuer,
            document_fingerprint: fingerprint,
            issued_at,
            valid: true,
        };
        let receipt = self.store.commit(ChangeSet::single(
            StateWrite::PutRecord { holder, record },
            RegistryEvent::CredentialIssued {
                holder,
                issuer,
                fingerprint,
                issued_at,
            },
        ))?;

        tracing::info!(
            %holder,
            %issuer,
            %fingerprint,
            reissue = current.exists(),
            sequence = receipt.sequence,
            "credential issued"
        );
        Ok(receipt)
    }

    /// Add `verifier` to the caller's consent set.
    pub fn grant_consent(&self, caller: &Caller, verifier: Address) -> Result<Receipt, RegistryError> {
        let holder = caller.address();
        if verifier.is_zero() {
            return Err(RegistryError::InvalidInput(
                "verifier must be a non-zero address".into(),
            ));
        }
        if verifier == holder {
            return Err(RegistryError::InvalidInput(
                "a holder cannot grant consent to itself".into(),
            ));
        }

        let _gate = self.write_gate();
        let receipt = self.store.commit(ChangeSet::single(
            StateWrite::AddConsent { holder, verifier },
            RegistryEvent::ConsentGranted { holder, verifier },
        ))?;

        tracing::info!(%holder, %verifier, sequence = receipt.sequence, "consent granted");
        Ok(receipt)
    }

    /// Remove `verifier` from the caller's consent set. Succeeds even if the
    /// verifier held no consent.
    pub fn revoke_consent(&self, caller: &Caller, verifier: Address) -> Result<Receipt, RegistryError> {
        let holder = caller.address();
        if verifier.is_zero() {
            return Err(RegistryError::InvalidInput(
                "verifier must be a non-zero address".into(),
            ));
        }

        let _gate = self.write_gate();
        let receipt = self.store.commit(ChangeSet::single(
            StateWrite::RemoveConsent { holder, verifier },
            RegistryEvent::ConsentRevoked { holder, verifier },
        ))?;

        tracing::info!(%holder, %verifier, sequence = receipt.sequence, "consent revoked");
        Ok(receipt)
    }

    /// Mark `holder`'s record invalid. Only the recorded issuer may do this;
    /// issuer, fingerprint and timestamp stay readable.
    pub fn revoke_credential(&self, caller: &Caller, holder: Address) -> Result<Receipt, RegistryError> {
        if holder.is_zero() {
            return Err(RegistryError::InvalidInput(
                "holder must be a non-zero address".into(),
            ));
        }

        let _gate = self.write_gate();
        let current = self.stored_record(&holder)?;
        // A holder without a record has the zero issuer, which no caller matches.
        if current.issuer != caller.address() {
            tracing::warn!(caller = %caller, %holder, "revocation rejected: caller is not the issuer");
            return Err(RegistryError::Unauthorized {
                caller: caller.address(),
                holder,
            });
        }
        RecordStateMachine::transition(RecordState::of(&current), RecordEvent::Revoke)?;

        let record = CredentialRecord {
            valid: false,
            ..current
        };
        let receipt = self.store.commit(ChangeSet::single(
            StateWrite::PutRecord { holder, record },
            RegistryEvent::CredentialRevoked {
                holder,
                issuer: current.issuer,
            },
        ))?;

        tracing::info!(%holder, issuer = %current.issuer, sequence = receipt.sequence, "credential revoked");
        Ok(receipt)
    }

    /// Whether `holder` has a valid record matching `fingerprint` and the
    /// caller holds the holder's consent.
    ///
    /// Every failing condition, including a failed store read, yields the
    /// same `false`.
    pub fn verify_credential(&self, caller: &Caller, holder: Address, fingerprint: Fingerprint) -> bool {
        let _gate = self.read_gate();
        match self.check_credential(caller, &holder, &fingerprint) {
            Ok(valid) => {
                tracing::debug!(verifier = %caller, %holder, valid, "credential verification");
                valid
            }
            Err(e) => {
                tracing::warn!(error = %e, "store read failed during verification");
                false
            }
        }
    }

    fn check_credential(
        &self,
        caller: &Caller,
        holder: &Address,
        fingerprint: &Fingerprint,
    ) -> Result<bool, RegistryError> {
        let Some(record) = self.store.record(holder)? else {
            return Ok(false);
        };
        if !record.exists() || !record.valid || record.document_fingerprint != *fingerprint {
            return Ok(false);
        }
        Ok(self.store.has_consent(holder, &caller.address())?)
    }

    /// `(issuer, issued_at, valid)` for `holder`; zero values if never issued.
    pub fn get_record(&self, holder: &Address) -> Result<RecordView, RegistryError> {
        let _gate = self.read_gate();
        Ok(self.stored_record(holder)?.view())
    }

    /// The stored fingerprint for `holder`; zero if never issued.
    pub fn get_fingerprint(&self, holder: &Address) -> Result<Fingerprint, RegistryError> {
        let _gate = self.read_gate();
        Ok(self.stored_record(holder)?.document_fingerprint)
    }

    /// Whether `verifier` holds `holder`'s consent.
    pub fn has_consent(&self, holder: &Address, verifier: &Address) -> Result<bool, RegistryError> {
        let _gate = self.read_gate();
        Ok(self.store.has_consent(holder, verifier)?)
    }

    /// The verifiers currently holding `holder`'s consent.
    pub fn consents(&self, holder: &Address) -> Result<Vec<Address>, RegistryError> {
        let _gate = self.read_gate();
        Ok(self.store.consents(holder)?)
    }

    /// The lifecycle state of `holder`'s record.
    pub fn record_state(&self, holder: &Address) -> Result<RecordState, RegistryError> {
        let _gate = self.read_gate();
        Ok(RecordState::of(&self.stored_record(holder)?))
    }

    /// Events matching `filter`, in sequence order.
    pub fn events(&self, filter: &EventFilter) -> Result<Vec<SequencedEvent>, RegistryError> {
        let _gate = self.read_gate();
        Ok(self.store.events(filter)?)
    }

    /// Sequence number of the most recent committed operation.
    pub fn last_sequence(&self) -> Result<u64, RegistryError> {
        let _gate = self.read_gate();
        Ok(self.store.last_sequence()?)
    }
}
