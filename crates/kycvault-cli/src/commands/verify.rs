//! `kycvault verify`: check a holder's credential against a document.

use clap::Args;
use serde::Deserialize;

use kycvault_core::{Address, VerifyQuery};
use kycvault_crypto::SignedEnvelope;

use super::{DocumentArgs, KeyArgs, NodeArgs};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Holder address.
    #[arg(long)]
    pub holder: Address,

    #[command(flatten)]
    pub document: DocumentArgs,

    // Key of the verifier making the query.
    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct VerifyResponse {
    valid: bool,
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let keypair = args.key.load()?;
    let query = VerifyQuery {
        holder: args.holder,
        fingerprint: args.document.resolve()?,
        issued_at: unix_now(),
    };
    let envelope = SignedEnvelope::seal(&keypair, query)?;
    let resp: VerifyResponse = args
        .node
        .client()?
        .post("/credentials/verify", &envelope)
        .await?;

    if resp.valid {
        println!("VALID: {} holds a matching, unrevoked credential", args.holder);
    } else {
        // No reason is given; the node does not reveal which check failed.
        println!("NOT VALID");
    }
    Ok(())
}
