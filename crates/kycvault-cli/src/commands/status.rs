//! `kycvault status`: query the status of a running node.

use clap::Args;
use serde::Deserialize;

use super::NodeArgs;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    started_at: String,
    uptime_secs: u64,
    issuance: String,
    last_sequence: u64,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let status: StatusResponse = match args.node.client()?.get("/status").await {
        Ok(status) => status,
        Err(e) => {
            println!("Error: {:#}", e);
            println!();
            println!("Is the node running? Start it with: kycvault-node");
            return Ok(());
        }
    };

    println!("Node Status:");
    println!("  Version:       {}", status.version);
    println!("  Started:       {}", status.started_at);
    println!("  Uptime:        {}s", status.uptime_secs);
    println!("  Issuance:      {}", status.issuance);
    println!("  Last sequence: {}", status.last_sequence);
    if status.issuance == "open" {
        println!("  Warning:       any account may issue credentials");
    }
    Ok(())
}
