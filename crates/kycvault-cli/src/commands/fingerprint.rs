//! `kycvault fingerprint`: compute the fingerprint of a document.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use kycvault_crypto::{fingerprint_file, FingerprintAlgorithm};

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Document file.
    pub document: PathBuf,

    /// Digest algorithm (keccak256, blake3).
    #[arg(short, long, default_value_t = FingerprintAlgorithm::default())]
    pub algorithm: FingerprintAlgorithm,
}

pub fn run(args: &FingerprintArgs) -> anyhow::Result<()> {
    let fingerprint = fingerprint_file(args.algorithm, &args.document)
        .with_context(|| format!("failed to fingerprint {}", args.document.display()))?;
    println!("{}", fingerprint);
    Ok(())
}
