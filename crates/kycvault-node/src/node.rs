//! The KYC Vault node orchestrator.
//!
//! Opens storage, builds the registry with the configured issuer policy,
//! serves the HTTP API in a background task and runs the command loop that
//! applies every state-changing submission in arrival order.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use kycvault_core::{Caller, IssuancePolicyKind, Receipt, Submission};
use kycvault_crypto::SignedEnvelope;
use kycvault_registry::{policy_from_config, CredentialRegistry, RegistryStore};

use crate::commands::{CommandError, NodeCommand};
use crate::config::KycVaultConfig;
use crate::state::{NodeState, Registry};
use crate::storage::RocksStore;

/// The KYC Vault node.
pub struct KycVaultNode {
    /// Node configuration.
    config: KycVaultConfig,
    /// Persistent storage, shared with the registry.
    storage: Option<Arc<RocksStore>>,
    /// The credential registry.
    registry: Option<Arc<Registry>>,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
}

impl KycVaultNode {
    /// Create a new node with the given config. Nothing is opened until `start`.
    pub fn new(config: KycVaultConfig) -> Result<Self> {
        // Surface malformed trusted issuers before touching storage.
        config.registry.trusted_issuer_addresses()?;
        Ok(Self {
            config,
            storage: None,
            registry: None,
            node_state: None,
            command_rx: None,
        })
    }

    /// Open storage, build the registry and start the HTTP API.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting KYC Vault node");

        let storage = Arc::new(RocksStore::open(&self.config.storage.data_dir)?);
        tracing::info!(
            path = %self.config.storage.data_dir.display(),
            last_sequence = storage.last_sequence()?,
            "storage initialized"
        );

        let policy = policy_from_config(&self.config.registry)?;
        if policy.kind() == IssuancePolicyKind::Open {
            tracing::warn!("issuance is open: any account may issue credentials for any holder");
        }
        let registry = Arc::new(CredentialRegistry::with_policy(
            Arc::clone(&storage),
            policy,
        ));

        let (command_tx, command_rx) =
            mpsc::channel::<NodeCommand>(self.config.api.command_queue.max(1));
        let node_state = Arc::new(NodeState::new(
            Arc::clone(&registry),
            Arc::clone(&storage),
            command_tx,
            self.config.api.verify_max_skew_secs,
        ));

        let api_addr: SocketAddr = self.config.api_addr().parse()?;
        let api_state = Arc::clone(&node_state);
        tokio::spawn(async move {
            if let Err(e) = crate::api::start_api_server(api_addr, api_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });

        self.storage = Some(storage);
        self.registry = Some(registry);
        self.node_state = Some(node_state);
        self.command_rx = Some(command_rx);

        Ok(())
    }

    /// Run the command loop until the command channel closes.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let registry = self
            .registry
            .clone()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let storage = self
            .storage
            .clone()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        tracing::info!("entering command loop");

        while let Some(cmd) = command_rx.recv().await {
            Self::handle_command(cmd, &registry, &storage);
        }

        tracing::info!("API command channel closed");
        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down KYC Vault node");

        self.node_state = None;
        self.command_rx = None;
        self.registry = None;

        if let Some(storage) = self.storage.take() {
            drop(storage);
            tracing::info!("storage closed");
        }

        tracing::info!("KYC Vault node shut down");
        Ok(())
    }

    /// Shared state, once started.
    #[cfg(test)]
    pub fn state(&self) -> Option<&Arc<NodeState>> {
        self.node_state.as_ref()
    }

    fn handle_command(cmd: NodeCommand, registry: &Registry, storage: &RocksStore) {
        match cmd {
            NodeCommand::Submit {
                envelope,
                route,
                reply,
            } => {
                let result = process_submission(registry, storage, envelope, route);
                if let Err(ref e) = result {
                    tracing::warn!(route, error = %e, "submission rejected");
                }
                let _ = reply.send(result);
            }
        }
    }
}

/// Authenticate, nonce-check and execute one submission.
///
/// The nonce is consumed once the signature, endpoint and nonce checks pass,
/// even if the registry then rejects the call. An accepted call and its
/// nonce bump are written in one batch.
pub(crate) fn process_submission(
    registry: &Registry,
    storage: &RocksStore,
    envelope: SignedEnvelope<Submission>,
    route: &'static str,
) -> Result<Receipt, CommandError> {
    let (signer, submission) = envelope.open()?;
    let caller = Caller::new(signer)?;

    let method = submission.call.method();
    if method != route {
        return Err(CommandError::WrongEndpoint { method, route });
    }

    let expected = storage.nonce(&signer)?;
    if submission.nonce != expected {
        return Err(CommandError::BadNonce {
            expected,
            got: submission.nonce,
        });
    }
    let result = storage.with_nonce(&signer, expected + 1, || {
        registry.execute(&caller, &submission.call)
    })?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycvault_core::{Address, Fingerprint, RegistryCall};
    use kycvault_crypto::KeyPair;
    use kycvault_registry::RegistryError;
    use std::path::{Path, PathBuf};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kycvault-node-test-{}", rand::random::<u64>()))
    }

    fn open(dir: &Path) -> (Registry, Arc<RocksStore>) {
        let storage = Arc::new(RocksStore::open(dir).unwrap());
        (CredentialRegistry::new(Arc::clone(&storage)), storage)
    }

    fn submit(
        registry: &Registry,
        storage: &RocksStore,
        keypair: &KeyPair,
        nonce: u64,
        call: RegistryCall,
    ) -> Result<Receipt, CommandError> {
        let route = call.method();
        let envelope = SignedEnvelope::seal(keypair, Submission { nonce, call }).unwrap();
        process_submission(registry, storage, envelope, route)
    }

    fn issue(holder: Address) -> RegistryCall {
        RegistryCall::IssueCredential {
            holder,
            fingerprint: Fingerprint::from_bytes([0xaa; 32]),
        }
    }

    #[test]
    fn test_node_creation() {
        let node = KycVaultNode::new(KycVaultConfig::default());
        assert!(node.is_ok());
        assert!(node.unwrap().state().is_none());
    }

    #[test]
    fn test_node_rejects_bad_trusted_issuer() {
        let mut config = KycVaultConfig::default();
        config.registry.trusted_issuers = vec!["not-an-address".into()];
        assert!(KycVaultNode::new(config).is_err());
    }

    #[test]
    fn test_submission_executes_and_consumes_nonce() {
        let dir = temp_dir();
        let (registry, storage) = open(&dir);
        let issuer = KeyPair::generate();
        let holder = KeyPair::generate().address();

        let receipt = submit(&registry, &storage, &issuer, 0, issue(holder)).unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(storage.nonce(&issuer.address()).unwrap(), 1);
        assert_eq!(registry.get_record(&holder).unwrap().issuer, issuer.address());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_replayed_nonce_rejected() {
        let dir = temp_dir();
        let (registry, storage) = open(&dir);
        let issuer = KeyPair::generate();
        let holder = KeyPair::generate().address();

        let envelope =
            SignedEnvelope::seal(&issuer, Submission { nonce: 0, call: issue(holder) }).unwrap();
        process_submission(&registry, &storage, envelope.clone(), "issue_credential").unwrap();
        let replay = process_submission(&registry, &storage, envelope, "issue_credential");
        assert!(matches!(
            replay,
            Err(CommandError::BadNonce { expected: 1, got: 0 })
        ));
        assert_eq!(registry.last_sequence().unwrap(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_tampered_envelope_rejected() {
        let dir = temp_dir();
        let (registry, storage) = open(&dir);
        let issuer = KeyPair::generate();

        let mut envelope = SignedEnvelope::seal(
            &issuer,
            Submission {
                nonce: 0,
                call: issue(Address::from_bytes([1; 20])),
            },
        )
        .unwrap();
        envelope.body.call = issue(Address::from_bytes([2; 20]));
        let result = process_submission(&registry, &storage, envelope, "issue_credential");
        assert!(matches!(result, Err(CommandError::InvalidSignature(_))));
        assert_eq!(storage.nonce(&issuer.address()).unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_endpoint_does_not_consume_nonce() {
        let dir = temp_dir();
        let (registry, storage) = open(&dir);
        let holder = KeyPair::generate();

        let envelope = SignedEnvelope::seal(
            &holder,
            Submission {
                nonce: 0,
                call: RegistryCall::GrantConsent {
                    verifier: Address::from_bytes([3; 20]),
                },
            },
        )
        .unwrap();
        let result = process_submission(&registry, &storage, envelope, "revoke_consent");
        assert!(matches!(result, Err(CommandError::WrongEndpoint { .. })));
        assert_eq!(storage.nonce(&holder.address()).unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_registry_rejection_still_consumes_nonce() {
        let dir = temp_dir();
        let (registry, storage) = open(&dir);
        let stranger = KeyPair::generate();

        let result = submit(
            &registry,
            &storage,
            &stranger,
            0,
            RegistryCall::RevokeCredential {
                holder: Address::from_bytes([4; 20]),
            },
        );
        assert!(matches!(
            result,
            Err(CommandError::Registry(RegistryError::Unauthorized { .. }))
        ));
        assert_eq!(storage.nonce(&stranger.address()).unwrap(), 1);
        assert_eq!(registry.last_sequence().unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_node_start_run_and_shutdown() {
        let dir = temp_dir();
        let mut config = KycVaultConfig::default();
        config.storage.data_dir = dir.clone();
        config.api.port = 0;
        let mut node = KycVaultNode::new(config).unwrap();
        node.start().await.expect("start failed");

        let state = Arc::clone(node.state().unwrap());
        let command_loop = tokio::spawn(async move { node.run().await });

        let issuer = KeyPair::generate();
        let holder = KeyPair::generate().address();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        state
            .command_tx
            .send(NodeCommand::Submit {
                envelope: SignedEnvelope::seal(
                    &issuer,
                    Submission {
                        nonce: 0,
                        call: issue(holder),
                    },
                )
                .unwrap(),
                route: "issue_credential",
                reply: reply_tx,
            })
            .await
            .unwrap();
        let receipt = reply_rx.await.unwrap().unwrap();
        assert_eq!(receipt.sequence, 1);
        assert!(state.registry.get_record(&holder).unwrap().valid);

        // The API server task still holds a sender, so stop the loop by aborting it.
        command_loop.abort();
        assert!(command_loop.await.unwrap_err().is_cancelled());

        std::fs::remove_dir_all(&dir).ok();
    }
}
