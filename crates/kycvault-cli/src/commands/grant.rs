//! `kycvault grant`: grant a verifier consent.

use clap::Args;

use kycvault_core::{Address, RegistryCall};

use super::{KeyArgs, NodeArgs};
use crate::client::print_receipt;

#[derive(Args, Debug)]
pub struct GrantArgs {
    /// Verifier address.
    #[arg(long)]
    pub verifier: Address,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &GrantArgs) -> anyhow::Result<()> {
    let keypair = args.key.load()?;
    let receipt = args
        .node
        .client()?
        .submit(&keypair, RegistryCall::GrantConsent { verifier: args.verifier })
        .await?;
    println!("Consent granted to {}", args.verifier);
    print_receipt(&receipt);
    Ok(())
}
