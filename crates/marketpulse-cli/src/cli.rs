//! CLI argument definitions for MarketPulse.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch latest quotes for symbols |
//! | `history` | Fetch recent daily closes |
//! | `lookup` | Search symbols through Alpha Vantage |
//! | `search` | Autocomplete against the local listing directory |
//! | `watchlist` | Manage and refresh the saved watchlist |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--data-dir` | `.marketpulse` | Directory for snapshots and the watchlist |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! marketpulse quote AAPL MSFT
//! marketpulse history NVDA --limit 30 --pretty
//! marketpulse watchlist refresh --force
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// MarketPulse - watchlist market data from the command line
///
/// Provider keys are read from MARKETPULSE_FINNHUB_API_KEY,
/// MARKETPULSE_TWELVEDATA_API_KEY and MARKETPULSE_ALPHAVANTAGE_API_KEY
/// (or the same names without the MARKETPULSE_ prefix).
#[derive(Debug, Parser)]
#[command(name = "marketpulse", author, version, about = "Watchlist market data CLI")]
pub struct Cli {
    /// Directory holding the listing snapshot and the watchlist.
    #[arg(long, global = true, default_value = ".marketpulse")]
    pub data_dir: PathBuf,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for one or more symbols.
    ///
    ///   marketpulse quote AAPL
    ///   marketpulse quote AAPL MSFT GOOGL --pretty
    Quote(QuoteArgs),

    /// Fetch recent daily closing prices, oldest first.
    ///
    ///   marketpulse history AAPL --limit 30
    History(HistoryArgs),

    /// Search symbols by keyword through Alpha Vantage.
    Lookup(LookupArgs),

    /// Autocomplete against the local listing directory.
    ///
    /// The directory is downloaded when the snapshot is older than
    /// --max-age-days; a built-in list is used when nothing loads.
    Search(SearchArgs),

    /// Manage the saved watchlist.
    Watchlist(WatchlistArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more market symbols (e.g., AAPL, MSFT, BRK.B).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub symbol: String,

    /// Number of most recent closes to return.
    #[arg(long, default_value_t = 30)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Free-form keywords (symbol or company name).
    pub keywords: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Maximum snapshot age before a refresh is attempted.
    #[arg(long, default_value_t = 14)]
    pub max_age_days: u64,
}

#[derive(Debug, Args)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: WatchlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    /// Print the saved tickers.
    List,

    /// Add a ticker, optionally with a display name.
    Add(WatchlistAddArgs),

    /// Remove one or more tickers.
    Remove(WatchlistSymbolsArgs),

    /// Toggle the favorite flag of a ticker.
    Favorite(WatchlistFavoriteArgs),

    /// Fetch fresh quotes for every ticker.
    Refresh(WatchlistRefreshArgs),
}

#[derive(Debug, Args)]
pub struct WatchlistAddArgs {
    pub symbol: String,

    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchlistSymbolsArgs {
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WatchlistFavoriteArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct WatchlistRefreshArgs {
    /// Refresh tickers even when they were updated recently.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
