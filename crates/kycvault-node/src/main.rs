//! KYC Vault Node: entry point.
//!
//! Starts the KYC Vault node with configuration from a TOML file or defaults.

mod api;
mod commands;
mod config;
mod node;
mod state;
mod storage;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::KycVaultConfig;
use node::KycVaultNode;

/// KYC Vault Node
#[derive(Parser, Debug)]
#[command(name = "kycvault-node", version, about = "KYC Vault Node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "kycvault.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(config: &KycVaultConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.init {
        KycVaultConfig::default()
    } else {
        KycVaultConfig::load(&args.config)?
    };

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config);

    // Handle --init flag
    if args.init {
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    tracing::info!("KYC Vault Node v{}", env!("CARGO_PKG_VERSION"));

    let mut node = KycVaultNode::new(config)?;
    node.start().await?;

    tokio::select! {
        result = node.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "command loop error");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("received shutdown signal"),
                Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
            }
        }
    }

    node.shutdown().await?;
    tracing::info!("KYC Vault node exited cleanly");
    Ok(())
}
