//! `kycvault address`: show the address of a key file.

use clap::Args;

use super::KeyArgs;

#[derive(Args, Debug)]
pub struct AddressArgs {
    #[command(flatten)]
    pub key: KeyArgs,
}

pub fn run(args: &AddressArgs) -> anyhow::Result<()> {
    let keypair = args.key.load()?;
    println!("{}", keypair.address());
    Ok(())
}
