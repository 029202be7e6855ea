//! Wallet Screening - sanctions and malicious-contract risk checks for accounts

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use wallet_screening::cli::commands;
use wallet_screening::config::Config;

/// Wallet Screening - risk report for a blockchain account
#[derive(Parser)]
#[command(name = "screen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen an address and print the report as JSON
    Check {
        /// Account address (0x-prefixed)
        address: String,
    },

    /// Show loaded datasets and load diagnostics
    Datasets,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so JSON reports on stdout stay clean)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wallet_screening=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Check { address } => commands::check(&config, &address).await,
        Commands::Datasets => commands::datasets(&config),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
