mod availability;
mod booking;
mod client;
mod commands;
mod config;
mod error;
mod ledger;
mod models;
mod notify;
mod settings;
mod web;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Appointment booking for a single-location salon.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging and raw JSON output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the booking web server (public page + admin panel)
    Serve {
        /// Path to config file
        #[arg(short = 'c', long, default_value = "config.toml")]
        config: PathBuf,

        /// Listen address (e.g. "0.0.0.0:8000")
        #[arg(short = 'a', long, default_value = "0.0.0.0:8000")]
        addr: String,
    },

    /// Show free slots for a date
    ///
    /// Examples:
    ///   slots 2024-06-04
    Slots {
        /// Date as YYYY-MM-DD
        #[arg(value_name = "DATE")]
        date: String,

        /// Path to config file
        #[arg(short = 'c', long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// List all appointments ordered by date and time
    Appointments {
        /// Path to config file
        #[arg(short = 'c', long, default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &cli.command {
        Command::Serve { config, addr } => {
            let cfg = config::load_config(config)?;
            web::serve(cfg, addr).await?;
        }
        Command::Slots { date, config } => {
            let cfg = config::load_config(config)?;
            commands::run_slots(&cfg, date, cli.verbose).await?;
        }
        Command::Appointments { config } => {
            let cfg = config::load_config(config)?;
            commands::run_appointments(&cfg, cli.verbose).await?;
        }
    }

    Ok(())
}
