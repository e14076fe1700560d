//! `kycvault revoke`: revoke a credential you issued.

use clap::Args;

use kycvault_core::{Address, RegistryCall};

use super::{KeyArgs, NodeArgs};
use crate::client::print_receipt;

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Holder whose credential to revoke.
    #[arg(long)]
    pub holder: Address,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &RevokeArgs) -> anyhow::Result<()> {
    let keypair = args.key.load()?;
    let receipt = args
        .node
        .client()?
        .submit(&keypair, RegistryCall::RevokeCredential { holder: args.holder })
        .await?;
    println!("Credential revoked for {}", args.holder);
    print_receipt(&receipt);
    Ok(())
}
