//! RocksDB storage backend for the KYC Vault node.
//!
//! Records, consent pairs and events live in their own column families.
//! Every commit is one `WriteBatch`, so a change set and its event land
//! together or not at all. A nonce bump staged with [`RocksStore::with_nonce`]
//! joins the batch of the commit it guards.

use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use kycvault_core::{Address, CredentialRecord, EventFilter, Receipt, SequencedEvent};
use kycvault_registry::{ChangeSet, RegistryStore, StateWrite, StoreError};

/// Column family names for different data types.
const CF_RECORDS: &str = "records";
const CF_CONSENTS: &str = "consents";
const CF_EVENTS: &str = "events";
const CF_STATE: &str = "state";

const KEY_LAST_SEQUENCE: &[u8] = b"last_sequence";
const NONCE_PREFIX: &[u8] = b"nonce/";

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode_u64(raw: &[u8], what: &str) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = raw
        .try_into()
        .map_err(|_| StoreError::Corrupt(format!("{what}: expected 8 bytes, got {}", raw.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

fn consent_key(holder: &Address, verifier: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(holder.as_bytes());
    key.extend_from_slice(verifier.as_bytes());
    key
}

fn nonce_key(account: &Address) -> Vec<u8> {
    let mut key = NONCE_PREFIX.to_vec();
    key.extend_from_slice(account.as_bytes());
    key
}

/// RocksDB-backed registry store.
pub struct RocksStore {
    db: DB,
    /// Serializes sequence assignment across commits.
    commit_lock: Mutex<()>,
    /// Nonce bump to write with the next commit.
    staged_nonce: Mutex<Option<(Address, u64)>>,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RECORDS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CONSENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_EVENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_STATE, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            commit_lock: Mutex::new(()),
            staged_nonce: Mutex::new(None),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("column family '{name}' not found")))
    }

    /// The next nonce the node will accept from `account`.
    pub fn nonce(&self, account: &Address) -> Result<u64, StoreError> {
        let cf = self.cf(CF_STATE)?;
        match self.db.get_cf(cf, nonce_key(account)).map_err(backend)? {
            Some(raw) => decode_u64(&raw, "nonce"),
            None => Ok(0),
        }
    }

    /// Record the next nonce the node will accept from `account`.
    pub fn set_nonce(&self, account: &Address, next: u64) -> Result<(), StoreError> {
        let cf = self.cf(CF_STATE)?;
        self.db
            .put_cf(cf, nonce_key(account), next.to_be_bytes())
            .map_err(backend)
    }

    /// Run `apply` with `account`'s next nonce set to `next`.
    ///
    /// If `apply` commits a change set, the nonce is written in the same
    /// batch. Otherwise it is written on its own once `apply` returns.
    /// Callers must not run `with_nonce` concurrently.
    pub fn with_nonce<T>(
        &self,
        account: &Address,
        next: u64,
        apply: impl FnOnce() -> T,
    ) -> Result<T, StoreError> {
        *self.staged() = Some((*account, next));
        let out = apply();
        let unclaimed = self.staged().take();
        if let Some((account, next)) = unclaimed {
            self.set_nonce(&account, next)?;
        }
        Ok(out)
    }

    fn staged(&self) -> std::sync::MutexGuard<'_, Option<(Address, u64)>> {
        self.staged_nonce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn stage(&self, batch: &mut WriteBatch, write: &StateWrite) -> Result<(), StoreError> {
        match write {
            StateWrite::PutRecord { holder, record } => {
                let cf = self.cf(CF_RECORDS)?;
                batch.put_cf(cf, holder.as_bytes(), serde_json::to_vec(record)?);
            }
            StateWrite::AddConsent { holder, verifier } => {
                let cf = self.cf(CF_CONSENTS)?;
                batch.put_cf(cf, consent_key(holder, verifier), b"");
            }
            StateWrite::RemoveConsent { holder, verifier } => {
                let cf = self.cf(CF_CONSENTS)?;
                batch.delete_cf(cf, consent_key(holder, verifier));
            }
        }
        Ok(())
    }
}

impl RegistryStore for RocksStore {
    fn record(&self, holder: &Address) -> Result<Option<CredentialRecord>, StoreError> {
        let cf = self.cf(CF_RECORDS)?;
        match self.db.get_cf(cf, holder.as_bytes()).map_err(backend)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn has_consent(&self, holder: &Address, verifier: &Address) -> Result<bool, StoreError> {
        let cf = self.cf(CF_CONSENTS)?;
        Ok(self
            .db
            .get_cf(cf, consent_key(holder, verifier))
            .map_err(backend)?
            .is_some())
    }

    fn consents(&self, holder: &Address) -> Result<Vec<Address>, StoreError> {
        let cf = self.cf(CF_CONSENTS)?;
        let prefix: &[u8] = holder.as_bytes();
        let mut verifiers = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(backend)?;
            if !key.starts_with(prefix) {
                break;
            }
            verifiers.push(
                Address::from_slice(&key[prefix.len()..])
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            );
        }
        Ok(verifiers)
    }

    fn events(&self, filter: &EventFilter) -> Result<Vec<SequencedEvent>, StoreError> {
        let cf = self.cf(CF_EVENTS)?;
        let start = filter.from_sequence.max(1).to_be_bytes();
        let limit = filter.limit.unwrap_or(usize::MAX);
        let mut events = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&start[..], Direction::Forward))
        {
            if events.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(backend)?;
            let event: SequencedEvent = serde_json::from_slice(&value)?;
            if filter.matches(&event) {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn last_sequence(&self) -> Result<u64, StoreError> {
        let cf = self.cf(CF_STATE)?;
        match self.db.get_cf(cf, KEY_LAST_SEQUENCE).map_err(backend)? {
            Some(raw) => decode_u64(&raw, "last_sequence"),
            None => Ok(0),
        }
    }

    fn commit(&self, changes: ChangeSet) -> Result<Receipt, StoreError> {
        let _guard = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = self.last_sequence()? + 1;

        let mut batch = WriteBatch::default();
        for write in &changes.writes {
            self.stage(&mut batch, write)?;
        }
        let receipt = SequencedEvent {
            sequence,
            event: changes.event,
        };
        batch.put_cf(
            self.cf(CF_EVENTS)?,
            sequence.to_be_bytes(),
            serde_json::to_vec(&receipt)?,
        );
        let state = self.cf(CF_STATE)?;
        batch.put_cf(state, KEY_LAST_SEQUENCE, sequence.to_be_bytes());
        if let Some((account, next)) = self.staged().take() {
            batch.put_cf(state, nonce_key(&account), next.to_be_bytes());
        }
        self.db.write(batch).map_err(backend)?;

        tracing::debug!(sequence, event = receipt.event.name(), "committed change set");
        Ok(receipt)
    }
}
