//! Binary entry point for asset-inventory.
//!
//! This binary provides the CLI and the REST server of the asset inventory.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use asset_inventory::InventoryConfig;
use asset_inventory::io::ImportFormat;
use asset_inventory::observability::{self, LoggingConfig};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

/// Asset Inventory - a time-bounded inventory of assets and their owners.
#[derive(Parser)]
#[command(name = "asset-inventory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "INVENTORY_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the REST API until Ctrl-C.
    #[cfg(feature = "http")]
    Serve {
        /// Listen address, overriding the configuration.
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },

    /// Ingest a bulk payload.
    Import {
        /// Payload format; detected from the file extension when omitted.
        #[arg(short, long)]
        format: Option<ImportFormat>,

        /// Payload file, or `-` for stdin.
        file: Option<PathBuf>,
    },

    /// Ensure the configured universe and show it.
    Universe,

    /// Show element counts per label.
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg_attr(not(feature = "http"), allow(unused_mut))]
    let mut config = match InventoryConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_logging(LoggingConfig::new(
        config.log_format,
        cli.verbose || config.debug,
    )) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    #[cfg(feature = "http")]
    if let Commands::Serve { listen } = &cli.command {
        if let Some(listen) = listen {
            config = config.with_listen(*listen);
        }
        if let Some(addr) = config.metrics_listen {
            if let Err(e) = observability::install_prometheus(Some(addr)) {
                eprintln!("Failed to initialize metrics: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    match run_command(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: &InventoryConfig) -> anyhow::Result<()> {
    match command {
        #[cfg(feature = "http")]
        Commands::Serve { .. } => commands::cmd_serve(config).await,

        Commands::Import { format, file } => {
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                commands::cmd_import(&config, format, file.as_deref())
            })
            .await?
        },

        Commands::Universe => commands::cmd_universe(config),

        Commands::Stats => commands::cmd_stats(config),
    }
}
