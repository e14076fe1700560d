//! `kycvault revoke-consent`: withdraw a verifier's consent.

use clap::Args;

use kycvault_core::{Address, RegistryCall};

use super::{KeyArgs, NodeArgs};
use crate::client::print_receipt;

#[derive(Args, Debug)]
pub struct RevokeConsentArgs {
    /// Verifier address.
    #[arg(long)]
    pub verifier: Address,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &RevokeConsentArgs) -> anyhow::Result<()> {
    let keypair = args.key.load()?;
    let receipt = args
        .node
        .client()?
        .submit(&keypair, RegistryCall::RevokeConsent { verifier: args.verifier })
        .await?;
    println!("Consent revoked for {}", args.verifier);
    print_receipt(&receipt);
    Ok(())
}
