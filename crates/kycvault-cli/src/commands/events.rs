//! `kycvault events`: list registry events.

use clap::Args;
use serde::Deserialize;

use kycvault_core::{Address, SequencedEvent};

use super::NodeArgs;

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Only events involving this address.
    #[arg(long)]
    pub address: Option<Address>,

    /// First sequence number to return.
    #[arg(long, default_value_t = 1)]
    pub from: u64,

    /// Maximum number of events.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Print raw JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct EventsResponse {
    events: Vec<SequencedEvent>,
}

pub async fn run(args: &EventsArgs) -> anyhow::Result<()> {
    let mut path = format!("/events?from={}&limit={}", args.from, args.limit);
    if let Some(address) = args.address {
        path.push_str(&format!("&address={}", address));
    }
    let resp: EventsResponse = args.node.client()?.get(&path).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resp.events)?);
        return Ok(());
    }
    if resp.events.is_empty() {
        println!("No events.");
    }
    for event in &resp.events {
        println!("#{:<6} {}", event.sequence, event.event);
    }
    Ok(())
}
