//! `kycvault record`: show a holder's record.

use clap::Args;
use serde::Deserialize;

use kycvault_core::{Address, Fingerprint};

use super::NodeArgs;

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Holder address.
    #[arg(long)]
    pub holder: Address,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct RecordResponse {
    issuer: Address,
    issued_at: u64,
    valid: bool,
}

#[derive(Deserialize)]
struct FingerprintResponse {
    fingerprint: Fingerprint,
}

pub async fn run(args: &RecordArgs) -> anyhow::Result<()> {
    let client = args.node.client()?;
    let record: RecordResponse = client.get(&format!("/records/{}", args.holder)).await?;

    println!("Record for {}:", args.holder);
    if record.issuer.is_zero() {
        println!("  (never issued)");
        return Ok(());
    }
    let fp: FingerprintResponse = client
        .get(&format!("/records/{}/fingerprint", args.holder))
        .await?;
    println!("  Issuer:      {}", record.issuer);
    println!("  Issued at:   {}", record.issued_at);
    println!("  Valid:       {}", record.valid);
    println!("  Fingerprint: {}", fp.fingerprint);
    Ok(())
}
