//! Subcommand implementations and the argument groups they share.

pub mod address;
pub mod consent;
pub mod events;
pub mod fingerprint;
pub mod grant;
pub mod issue;
pub mod keygen;
pub mod record;
pub mod revoke;
pub mod revoke_consent;
pub mod status;
pub mod verify;

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

use kycvault_core::Fingerprint;
use kycvault_crypto::{fingerprint_file, FingerprintAlgorithm, KeyPair};

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

/// Where to reach the node.
#[derive(Args, Debug)]
pub struct NodeArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

impl NodeArgs {
    pub fn client(&self) -> anyhow::Result<NodeClient> {
        NodeClient::new(&self.endpoint)
    }
}

/// The signing account.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Key file holding the hex-encoded seed.
    #[arg(short, long, default_value = "kycvault.key")]
    pub key: PathBuf,
}

impl KeyArgs {
    pub fn load(&self) -> anyhow::Result<KeyPair> {
        load_keypair(&self.key)
    }
}

/// A document given either by fingerprint or by file.
#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Document fingerprint (0x-prefixed hex).
    #[arg(long, required_unless_present = "document", conflicts_with = "document")]
    pub fingerprint: Option<Fingerprint>,

    /// Document file to fingerprint locally.
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Fingerprint algorithm used with --document.
    #[arg(long, default_value_t = FingerprintAlgorithm::default())]
    pub algorithm: FingerprintAlgorithm,
}

impl DocumentArgs {
    pub fn resolve(&self) -> anyhow::Result<Fingerprint> {
        match (&self.fingerprint, &self.document) {
            (Some(fingerprint), _) => Ok(*fingerprint),
            (None, Some(path)) => fingerprint_file(self.algorithm, path)
                .with_context(|| format!("failed to fingerprint {}", path.display())),
            (None, None) => anyhow::bail!("either --fingerprint or --document is required"),
        }
    }
}

/// Read a key file written by `kycvault keygen`.
pub fn load_keypair(path: &Path) -> anyhow::Result<KeyPair> {
    let seed = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    KeyPair::from_seed_hex(&seed)
        .with_context(|| format!("invalid key file {}", path.display()))
}
