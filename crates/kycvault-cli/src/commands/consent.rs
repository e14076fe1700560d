//! `kycvault consent`: show a holder's consents.

use clap::Args;
use serde::Deserialize;

use kycvault_core::Address;

use super::NodeArgs;

#[derive(Args, Debug)]
pub struct ConsentArgs {
    /// Holder address.
    #[arg(long)]
    pub holder: Address,

    /// Check a single verifier instead of listing all.
    #[arg(long)]
    pub verifier: Option<Address>,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct ConsentResponse {
    has_consent: bool,
}

#[derive(Deserialize)]
struct ConsentsResponse {
    verifiers: Vec<Address>,
}

pub async fn run(args: &ConsentArgs) -> anyhow::Result<()> {
    let client = args.node.client()?;

    if let Some(verifier) = args.verifier {
        let resp: ConsentResponse = client
            .get(&format!("/consents/{}/{}", args.holder, verifier))
            .await?;
        println!(
            "{} {} consent from {}",
            verifier,
            if resp.has_consent { "has" } else { "does not have" },
            args.holder
        );
        return Ok(());
    }

    let resp: ConsentsResponse = client.get(&format!("/consents/{}", args.holder)).await?;
    println!("Consents granted by {}:", args.holder);
    if resp.verifiers.is_empty() {
        println!("  (none)");
    }
    for verifier in &resp.verifiers {
        println!("  {}", verifier);
    }
    Ok(())
}
