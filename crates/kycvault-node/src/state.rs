//! Shared node state for the HTTP handlers.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use kycvault_registry::CredentialRegistry;

use crate::commands::NodeCommand;
use crate::storage::RocksStore;

/// The registry as the node runs it.
pub type Registry = CredentialRegistry<Arc<RocksStore>>;

/// Shared state for the running node, accessible from HTTP handlers.
pub struct NodeState {
    /// When the node started.
    pub start_time: Instant,
    /// Wall-clock start time, reported by the status endpoint.
    pub started_at: DateTime<Utc>,
    /// Read access to the registry. Writes go through `command_tx`.
    pub registry: Arc<Registry>,
    /// Account nonces.
    pub storage: Arc<RocksStore>,
    /// Channel to send commands to the command loop.
    pub command_tx: mpsc::Sender<NodeCommand>,
    /// Accepted distance between a verification query's `issued_at` and now.
    pub verify_max_skew_secs: u64,
}

impl NodeState {
    pub fn new(
        registry: Arc<Registry>,
        storage: Arc<RocksStore>,
        command_tx: mpsc::Sender<NodeCommand>,
        verify_max_skew_secs: u64,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            registry,
            storage,
            command_tx,
            verify_max_skew_secs,
        }
    }

    /// Wall-clock seconds since the Unix epoch.
    pub fn unix_now(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
