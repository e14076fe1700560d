//! `kycvault keygen`: generate a new account key file.

use anyhow::Context;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

use kycvault_crypto::KeyPair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the key file.
    #[arg(short, long, default_value = "kycvault.key")]
    pub out: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            args.out.display()
        );
    }

    let keypair = KeyPair::generate();
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    writeln!(file, "{}", keypair.to_seed_hex())?;

    println!("Key generated!");
    println!("  File:       {}", args.out.display());
    println!("  Address:    {}", keypair.address());
    println!("  Public key: {}", keypair.public_key().to_hex());
    Ok(())
}
