//! KYC Vault CLI: command-line interface for the credential registry.
//!
//! Subcommands: keygen, address, fingerprint, issue, revoke, grant,
//! revoke-consent, verify, record, consent, events, status.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// KYC Vault: consent-gated credential registry.
#[derive(Parser, Debug)]
#[command(name = "kycvault", version, about, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new account key file.
    Keygen(commands::keygen::KeygenArgs),
    /// Show the address of a key file.
    Address(commands::address::AddressArgs),
    /// Compute the fingerprint of a document.
    Fingerprint(commands::fingerprint::FingerprintArgs),
    /// Issue a credential to a holder.
    Issue(commands::issue::IssueArgs),
    /// Revoke a credential you issued.
    Revoke(commands::revoke::RevokeArgs),
    /// Grant a verifier consent to check your credential.
    Grant(commands::grant::GrantArgs),
    /// Withdraw a verifier's consent.
    RevokeConsent(commands::revoke_consent::RevokeConsentArgs),
    /// Check a holder's credential against a document.
    Verify(commands::verify::VerifyArgs),
    /// Show a holder's record.
    Record(commands::record::RecordArgs),
    /// Show a holder's consents.
    Consent(commands::consent::ConsentArgs),
    /// List registry events.
    Events(commands::events::EventsArgs),
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Address(args) => commands::address::run(args),
        Commands::Fingerprint(args) => commands::fingerprint::run(args),
        Commands::Issue(args) => commands::issue::run(args).await,
        Commands::Revoke(args) => commands::revoke::run(args).await,
        Commands::Grant(args) => commands::grant::run(args).await,
        Commands::RevokeConsent(args) => commands::revoke_consent::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Record(args) => commands::record::run(args).await,
        Commands::Consent(args) => commands::consent::run(args).await,
        Commands::Events(args) => commands::events::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
    }
}
