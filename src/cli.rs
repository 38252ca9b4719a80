use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "marketpulse")]
#[command(about = "Market analysis CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one analysis pass over the symbol universe
    Analyze {
        /// Path to the universe JSON file (default: universe.json or $UNIVERSE_FILE)
        #[arg(short, long)]
        universe: Option<PathBuf>,

        /// Lookback period (1mo, 3mo, 6mo, 1y, 2y, 5y)
        #[arg(short, long, default_value = "1y")]
        period: String,

        /// Bar interval (1D, 1H, 1m)
        #[arg(short, long, default_value = "1D")]
        interval: String,

        /// Worker pool size
        #[arg(long)]
        pool_size: Option<usize>,

        /// Per-symbol wall-clock timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Cache freshness window in seconds
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Show recent analysis results
    History {
        /// Restrict to one symbol
        #[arg(short, long)]
        symbol: Option<String>,

        /// Maximum rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Re-encode legacy cache entries into the current format
    MigrateCache,
    /// Delete stored results
    ClearHistory {
        /// Keep the most recent result per symbol, delete the rest
        #[arg(long)]
        duplicates_only: bool,
    },
    /// Show cache and result store status
    Status,
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            universe,
            period,
            interval,
            pool_size,
            timeout_secs,
            ttl_secs,
        } => {
            commands::analyze::run(universe, period, interval, pool_size, timeout_secs, ttl_secs)
                .await;
        }
        Commands::History { symbol, limit } => {
            commands::history::run(symbol, limit).await;
        }
        Commands::MigrateCache => {
            commands::migrate::run().await;
        }
        Commands::ClearHistory { duplicates_only } => {
            commands::clear::run(duplicates_only).await;
        }
        Commands::Status => {
            commands::status::run().await;
        }
    }
}
