//! CLI argument definitions for marketlens.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `collect` | Re-collect the universe and replace the snapshot |
//! | `universe` | List collected tickers with sectors and row counts |
//! | `risk` | Risk metrics of one ticker |
//! | `portfolio` | Weighted portfolio performance |
//! | `correlation` | Pairwise return correlation |
//! | `sectors` | Equal-weighted sector performance |
//! | `master` | Date-aligned close prices |
//! | `summary` | Headline figures for one company |
//! | `monthly` | Month-end closes and monthly returns |
//! | `scatter` | Annual return against volatility per ticker |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | `./marketlens.toml` if present | Configuration file |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | Use deterministic synthetic data |
//!
//! # Examples
//!
//! ```bash
//! # Collect two years of history for the configured universe
//! marketlens collect
//!
//! # Risk metrics for one ticker, pretty printed
//! marketlens risk AAPL --pretty
//!
//! # A 60/40 portfolio
//! marketlens portfolio AAPL MSFT --weights 0.6,0.4
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use marketlens_core::{HistoryPeriod, TradeDate};

/// Financial analytics over a snapshot of daily equity prices.
///
/// The first command that needs data loads the snapshot from the marketlens
/// home directory, collecting and saving it when none exists yet.
#[derive(Debug, Parser)]
#[command(
    name = "marketlens",
    author,
    version,
    about = "Financial analytics over daily equity prices",
    long_about = "marketlens collects daily OHLCV history for a universe of equities, \
enriches it with returns and technical indicators, stores a DuckDB snapshot and \
serves risk, portfolio, correlation and sector analytics as JSON.\n\
\n\
Use 'marketlens <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Configuration file. Defaults to `marketlens.toml` in the working
    /// directory when present; `MARKETLENS_*` variables override either.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Re-collect history and replace the stored snapshot.
    ///
    /// Without tickers the configured universe is collected. Prints the
    /// collection report, including tickers that failed.
    ///
    /// # Examples
    ///
    ///   marketlens collect
    ///   marketlens collect --period 5y AAPL MSFT
    Collect(CollectArgs),

    /// List tickers in the universe with sector and row counts.
    Universe,

    /// Risk metrics of one ticker's daily returns.
    ///
    /// # Examples
    ///
    ///   marketlens risk NVDA
    Risk(TickerArgs),

    /// Performance of a weighted portfolio.
    ///
    /// Weights default to equal weight over the requested tickers and are
    /// not renormalized when a ticker is missing from the universe.
    ///
    /// # Examples
    ///
    ///   marketlens portfolio AAPL MSFT GOOGL
    ///   marketlens portfolio AAPL MSFT --weights 0.6,0.4
    Portfolio(PortfolioArgs),

    /// Pairwise correlation of daily returns.
    ///
    /// Without tickers the whole universe is correlated.
    Correlation(TickersArgs),

    /// Equal-weighted performance per sector.
    Sectors,

    /// Date-aligned close prices.
    ///
    /// # Examples
    ///
    ///   marketlens master --from 2024-01-01 --to 2024-03-31 AAPL MSFT
    ///   marketlens master --normalize AAPL MSFT
    Master(MasterArgs),

    /// Headline figures for one company.
    Summary(TickerArgs),

    /// Month-end closes and month-over-month returns for one ticker.
    Monthly(TickerArgs),

    /// Annual return against annual volatility per ticker.
    Scatter(TickersArgs),
}

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Lookback period (6mo, 1y, 2y, 5y, 10y, max). Defaults to the configured period.
    #[arg(long)]
    pub period: Option<HistoryPeriod>,

    /// Tickers to collect. Defaults to the configured universe.
    pub tickers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TickerArgs {
    /// Ticker symbol, e.g. AAPL.
    pub ticker: String,
}

#[derive(Debug, Args)]
pub struct TickersArgs {
    /// Ticker symbols; empty means the whole universe.
    pub tickers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PortfolioArgs {
    /// Portfolio members.
    #[arg(required = true)]
    pub tickers: Vec<String>,

    /// Comma-separated weights, one per ticker.
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,
}

#[derive(Debug, Args)]
pub struct MasterArgs {
    /// First date to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<TradeDate>,

    /// Last date to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<TradeDate>,

    /// Rebase each ticker to 100 at its first close in the range.
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Tickers to include; empty means the whole universe.
    pub tickers: Vec<String>,
}
