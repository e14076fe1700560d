//! `kycvault issue`: issue a credential to a holder.

use clap::Args;

use kycvault_core::{Address, RegistryCall};

use super::{DocumentArgs, KeyArgs, NodeArgs};
use crate::client::print_receipt;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Holder address.
    #[arg(long)]
    pub holder: Address,

    #[command(flatten)]
    pub document: DocumentArgs,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &IssueArgs) -> anyhow::Result<()> {
    let keypair = args.key.load()?;
    let fingerprint = args.document.resolve()?;
    let receipt = args
        .node
        .client()?
        .submit(
            &keypair,
            RegistryCall::IssueCredential {
                holder: args.holder,
                fingerprint,
            },
        )
        .await?;

    println!("Credential issued!");
    println!("  Holder:      {}", args.holder);
    println!("  Issuer:      {}", keypair.address());
    println!("  Fingerprint: {}", fingerprint);
    print_receipt(&receipt);
    Ok(())
}
