use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use kycvault_core::{Address, CredentialRecord, EventFilter, Receipt, SequencedEvent};

use crate::store::{ChangeSet, RegistryStore, StateWrite, StoreError};

/// In-memory registry store. Used as the test double and for embedded use.
#[derive(Default)]
pub struct MemoryStore {
    /// Holder → record.
    records: DashMap<Address, CredentialRecord>,
    /// Holder → verifiers holding consent.
    consents: DashMap<Address, BTreeSet<Address>>,
    /// Append-only event log. Its lock also serializes commits.
    log: Mutex<Vec<SequencedEvent>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holders with a record.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn apply(&self, write: StateWrite) {
        match write {
            StateWrite::PutRecord { holder, record } => {
                self.records.insert(holder, record);
            }
            StateWrite::AddConsent { holder, verifier } => {
                self.consents.entry(holder).or_default().insert(verifier);
            }
            StateWrite::RemoveConsent { holder, verifier } => {
                if let Some(mut set) = self.consents.get_mut(&holder) {
                    set.remove(&verifier);
                }
                self.consents.remove_if(&holder, |_, set| set.is_empty());
            }
        }
    }
}

impl RegistryStore for MemoryStore {
    fn record(&self, holder: &Address) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.records.get(holder).map(|e| *e.value()))
    }

    fn has_consent(&self, holder: &Address, verifier: &Address) -> Result<bool, StoreError> {
        Ok(self
            .consents
            .get(holder)
            .is_some_and(|set| set.contains(verifier)))
    }

    fn consents(&self, holder: &Address) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .consents
            .get(holder)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn events(&self, filter: &EventFilter) -> Result<Vec<SequencedEvent>, StoreError> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let matching = log.iter().filter(|e| filter.matches(e)).cloned();
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn last_sequence(&self) -> Result<u64, StoreError> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(log.last().map_or(0, |e| e.sequence))
    }

    fn commit(&self, changes: ChangeSet) -> Result<Receipt, StoreError> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = log.last().map_or(0, |e| e.sequence) + 1;
        for write in changes.writes {
            self.apply(write);
        }
        let receipt = SequencedEvent {
            sequence,
            event: changes.event,
        };
        log.push(receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycvault_core::{Fingerprint, RegistryEvent};

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn grant(holder: Address, verifier: Address) -> ChangeSet {
        ChangeSet::single(
            StateWrite::AddConsent { holder, verifier },
            RegistryEvent::ConsentGranted { holder, verifier },
        )
    }

    fn revoke(holder: Address, verifier: Address) -> ChangeSet {
        ChangeSet::single(
            StateWrite::RemoveConsent { holder, verifier },
            RegistryEvent::ConsentRevoked { holder, verifier },
        )
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryStore::new();
        assert!(store.record(&addr(1)).unwrap().is_none());
        assert!(!store.has_consent(&addr(1), &addr(2)).unwrap());
        assert!(store.consents(&addr(1)).unwrap().is_empty());
        assert_eq!(store.last_sequence().unwrap(), 0);
        assert!(store.events(&EventFilter::all()).unwrap().is_empty());
    }

    #[test]
    fn test_put_record() {
        let store = MemoryStore::new();
        let record = CredentialRecord {
            issuer: addr(9),
            document_fingerprint: Fingerprint::from_bytes([0xaa; 32]),
            issued_at: 100,
            valid: true,
        };
        let receipt = store
            .commit(ChangeSet::single(
                StateWrite::PutRecord {
                    holder: addr(1),
                    record,
                },
                RegistryEvent::CredentialIssued {
                    holder: addr(1),
                    issuer: addr(9),
                    fingerprint: record.document_fingerprint,
                    issued_at: 100,
                },
            ))
            .unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(store.record(&addr(1)).unwrap(), Some(record));
        assert_eq!(store.record_count(), 1);
    }

    #[test]
    fn test_consent_add_remove() {
        let store = MemoryStore::new();
        store.commit(grant(addr(1), addr(3))).unwrap();
        store.commit(grant(addr(1), addr(2))).unwrap();
        store.commit(grant(addr(1), addr(2))).unwrap();
        assert_eq!(store.consents(&addr(1)).unwrap(), vec![addr(2), addr(3)]);

        store.commit(revoke(addr(1), addr(2))).unwrap();
        store.commit(revoke(addr(1), addr(3))).unwrap();
        store.commit(revoke(addr(1), addr(3))).unwrap();
        assert!(!store.has_consent(&addr(1), &addr(2)).unwrap());
        assert!(store.consents(&addr(1)).unwrap().is_empty());
    }

    #[test]
    fn test_sequences_are_gap_free() {
        let store = MemoryStore::new();
        for i in 0..5u8 {
            let receipt = store.commit(grant(addr(1), addr(10 + i))).unwrap();
            assert_eq!(receipt.sequence, u64::from(i) + 1);
        }
        assert_eq!(store.last_sequence().unwrap(), 5);
    }

    #[test]
    fn test_event_filtering() {
        let store = MemoryStore::new();
        store.commit(grant(addr(1), addr(2))).unwrap();
        store.commit(grant(addr(5), addr(6))).unwrap();
        store.commit(revoke(addr(1), addr(2))).unwrap();

        let all = store.events(&EventFilter::all()).unwrap();
        assert_eq!(all.len(), 3);

        let for_two = store.events(&EventFilter::all().involving(addr(2))).unwrap();
        assert_eq!(
            for_two.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 3]
        );

        let later = store.events(&EventFilter::all().starting_at(2)).unwrap();
        assert_eq!(later.len(), 2);

        let limited = store.events(&EventFilter::all().limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].sequence, 1);
    }
}
