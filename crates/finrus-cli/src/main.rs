//! finrus CLI: fetch daily price history as JSON.
//!
//! Commands:
//! - `fetch` - one ticker over a date range
//! - `batch` - several tickers over the same range, paced sequentially
//! - `recent` - one ticker over the last N days
//!
//! Results go to stdout as pretty JSON; logs go to stderr (`RUST_LOG`
//! controls verbosity, default `info`).

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use finrus::{DateRange, HistoryService, RetrievalConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Most tickers accepted by one `batch` invocation.
const MAX_BATCH_TICKERS: usize = 10;

#[derive(Parser)]
#[command(name = "finrus", about = "Cached, retrying retrieval of daily price history")]
struct Cli {
    /// Path to a TOML retrieval config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bypass the cache for reads and writes.
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one ticker over a date range.
    Fetch {
        /// Ticker symbol (e.g., AAPL).
        ticker: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },
    /// Fetch several tickers over the same date range.
    Batch {
        /// Ticker symbols (e.g., AAPL MSFT GOOG).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },
    /// Fetch one ticker over the last N days.
    Recent {
        /// Ticker symbol (e.g., AAPL).
        ticker: String,

        /// Number of days back from today (1-365).
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    let service = HistoryService::yahoo(config);
    let use_cache = !cli.no_cache;

    match cli.command {
        Commands::Fetch { ticker, start, end } => {
            DateRange::parse(&start, &end)?.ensure_ordered()?;
            let result = service.retrieve(&ticker, &start, &end, use_cache).await?;
            print_json(&result)?;
            Ok(exit_code(result.is_success()))
        }
        Commands::Batch {
            tickers,
            start,
            end,
        } => {
            if tickers.len() > MAX_BATCH_TICKERS {
                bail!("At most {MAX_BATCH_TICKERS} tickers per batch, got {}", tickers.len());
            }
            DateRange::parse(&start, &end)?.ensure_ordered()?;
            let results = service
                .retrieve_many(&tickers, &start, &end, use_cache)
                .await?;
            print_json(&results)?;
            Ok(exit_code(results.values().all(|r| r.is_success())))
        }
        Commands::Recent { ticker, days } => {
            let result = service.retrieve_recent(&ticker, days, use_cache).await?;
            print_json(&result)?;
            Ok(exit_code(result.is_success()))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RetrievalConfig> {
    let Some(path) = path else {
        return Ok(RetrievalConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Ok(RetrievalConfig::from_toml_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

const fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
