//! Command-line parsing for the correlation explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the ingest/engine code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Default archive name, looked up in the working directory.
pub const DEFAULT_DATA_PATH: &str = "stock_data.zip";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "corrx", version, about = "Stock Correlation Explorer (20-day rolling window)")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Price archive (.zip) or directory of daily CSV files.
    ///
    /// Falls back to `CORRX_DATA` (also read from `.env`), then `./stock_data.zip`.
    #[arg(short = 'd', long, global = true, env = "CORRX_DATA")]
    pub data: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print ingest counters and the return matrix shape.
    Summary,
    /// List dates that have a full 20-day window behind them.
    Dates,
    /// List tickers.
    Tickers,
    /// Print the correlation matrix for a date and a set of tickers.
    Corr(CorrArgs),
    /// Print one pair's correlation at every valid date.
    Rolling(RollingArgs),
    /// Write a synthetic price archive.
    Sample(SampleArgs),
    /// Launch the interactive TUI (the default).
    Tui,
}

#[derive(Debug, Args, Clone)]
pub struct CorrArgs {
    /// As-of date (YYYY-MM-DD). Defaults to the last valid date.
    #[arg(long)]
    pub date: Option<String>,

    /// Comma-separated tickers (at least 2). Defaults to the first five.
    #[arg(short = 't', long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Export the rounded table to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Export the rounded table to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RollingArgs {
    /// Two comma-separated tickers, e.g. `MSFT,TSLA`.
    #[arg(long, value_delimiter = ',', num_args = 1)]
    pub pair: Vec<String>,

    /// Export the series to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output path: `*.zip` writes an archive, anything else a directory.
    #[arg(short = 'o', long, default_value = DEFAULT_DATA_PATH)]
    pub out: PathBuf,

    /// Comma-separated tickers (defaults to a built-in list of ten).
    #[arg(short = 't', long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Number of business days.
    #[arg(short = 'n', long, default_value_t = 120)]
    pub days: usize,

    /// First calendar day (rolled forward to a business day).
    #[arg(long, default_value = "2025-01-02")]
    pub start: NaiveDate,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability of writing a row with an empty price.
    #[arg(long, default_value_t = 0.0)]
    pub missing_prob: f64,

    /// Probability of adding a conflicting duplicate row.
    #[arg(long, default_value_t = 0.0)]
    pub duplicate_prob: f64,
}
