//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves the data source
//! - initialises logging
//! - loads the dataset and runs correlation queries
//! - prints reports and writes optional exports
//! - generates synthetic sample archives

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Command, CorrArgs, GlobalArgs, RollingArgs, SampleArgs, DEFAULT_DATA_PATH};
use crate::data::{generate_sample, write_sample, SampleConfig};
use crate::engine::{correlate, correlate_str, rolling_pair};
use crate::error::AppError;
use crate::logging::LogTarget;
use crate::report::CorrelationTable;

pub mod pipeline;

/// How many tickers a query selects when none are given.
pub const DEFAULT_SELECTION: usize = 5;

/// Entry point for the `corrx` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` has to be loaded before clap reads `CORRX_DATA`.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);

    let target = match (&command, cli.global.log_file.as_deref()) {
        (_, Some(path)) => LogTarget::File(path),
        (Command::Tui, None) => LogTarget::Off,
        (_, None) => LogTarget::Stderr,
    };
    crate::logging::init(&cli.global.log_level, target)?;

    match command {
        Command::Summary => handle_summary(&cli.global),
        Command::Dates => handle_dates(&cli.global),
        Command::Tickers => handle_tickers(&cli.global),
        Command::Corr(args) => handle_corr(&cli.global, args),
        Command::Rolling(args) => handle_rolling(&cli.global, args),
        Command::Sample(args) => handle_sample(args),
        Command::Tui => handle_tui(&cli.global),
    }
}

/// `--data` / `CORRX_DATA`, else `./stock_data.zip`.
pub fn data_path(global: &GlobalArgs) -> PathBuf {
    global
        .data
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

fn handle_summary(global: &GlobalArgs) -> Result<(), AppError> {
    let dataset = pipeline::load_dataset(&data_path(global))?;
    print!("{}", crate::report::format_dataset_summary(&dataset));
    Ok(())
}

fn handle_dates(global: &GlobalArgs) -> Result<(), AppError> {
    let dataset = pipeline::load_dataset(&data_path(global))?;
    for date in dataset.valid_dates() {
        println!("{}", date.format("%Y-%m-%d"));
    }
    Ok(())
}

fn handle_tickers(global: &GlobalArgs) -> Result<(), AppError> {
    let dataset = pipeline::load_dataset(&data_path(global))?;
    for id in dataset.instruments() {
        println!("{id}");
    }
    Ok(())
}

fn handle_corr(global: &GlobalArgs, args: CorrArgs) -> Result<(), AppError> {
    let dataset = pipeline::load_dataset(&data_path(global))?;

    let tickers: Vec<String> = if args.tickers.is_empty() {
        dataset.instruments().iter().take(DEFAULT_SELECTION).cloned().collect()
    } else {
        args.tickers
    };

    let outcome = match args.date.as_deref() {
        Some(date) => correlate_str(&dataset.returns, &tickers, date),
        None => {
            let date = dataset.default_date().ok_or_else(|| {
                AppError::new(3, "No date has a full 20-day window; pass --date or load more data.")
            })?;
            correlate(&dataset.returns, &tickers, date)
        }
    };

    print!("{}", crate::report::format_outcome(&outcome));

    let table = CorrelationTable::from_outcome(&outcome);
    if let Some(path) = &args.export_csv {
        crate::io::export::write_table_csv(path, &table)?;
        tracing::info!(path = %path.display(), "exported correlation table (csv)");
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_table_json(path, &table)?;
        tracing::info!(path = %path.display(), "exported correlation table (json)");
    }
    Ok(())
}

fn handle_rolling(global: &GlobalArgs, args: RollingArgs) -> Result<(), AppError> {
    let [a, b] = args.pair.as_slice() else {
        return Err(AppError::new(2, "--pair expects exactly two tickers, e.g. MSFT,TSLA"));
    };

    let dataset = pipeline::load_dataset(&data_path(global))?;
    let series = rolling_pair(&dataset.returns, a, b);
    print!("{}", crate::report::format_rolling(a, b, &series));

    if let Some(path) = &args.export_csv {
        crate::io::export::write_rolling_csv(path, &series)?;
        tracing::info!(path = %path.display(), points = series.len(), "exported rolling series");
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(&args);
    let data = generate_sample(&config)?;
    let files = write_sample(&data, &args.out)?;
    println!("Wrote {files} daily files to {}", args.out.display());
    Ok(())
}

fn handle_tui(global: &GlobalArgs) -> Result<(), AppError> {
    crate::tui::run(&data_path(global))
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    let defaults = SampleConfig::default();
    SampleConfig {
        tickers: if args.tickers.is_empty() {
            defaults.tickers
        } else {
            args.tickers.clone()
        },
        days: args.days,
        start: args.start,
        seed: args.seed,
        missing_prob: args.missing_prob,
        duplicate_prob: args.duplicate_prob,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(data: Option<&str>) -> GlobalArgs {
        GlobalArgs {
            data: data.map(PathBuf::from),
            log_level: "warn".to_string(),
            log_file: None,
        }
    }

    #[test]
    fn data_path_defaults_to_archive_in_cwd() {
        assert_eq!(data_path(&global(None)), PathBuf::from("stock_data.zip"));
        assert_eq!(data_path(&global(Some("prices"))), PathBuf::from("prices"));
    }

    #[test]
    fn sample_args_fall_back_to_default_tickers() {
        let cli = Cli::parse_from(["corrx", "sample", "-o", "out.zip", "-n", "30"]);
        let Some(Command::Sample(args)) = cli.command else {
            panic!("expected sample");
        };
        let config = sample_config_from_args(&args);
        assert_eq!(config.days, 30);
        assert_eq!(config.tickers.len(), 10);
    }

    #[test]
    fn rolling_rejects_single_ticker() {
        let args = RollingArgs {
            pair: vec!["MSFT".to_string()],
            export_csv: None,
        };
        let err = handle_rolling(&global(Some("does-not-matter")), args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn corr_exports_rounded_table() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stock_data.zip");
        let sample = generate_sample(&SampleConfig {
            tickers: vec!["AAA".to_string(), "BBB".to_string()],
            days: 25,
            ..SampleConfig::default()
        })
        .unwrap();
        write_sample(&sample, &archive).unwrap();

        let json = dir.path().join("table.json");
        let args = CorrArgs {
            date: None,
            tickers: vec![],
            export_csv: None,
            export_json: Some(json.clone()),
        };
        handle_corr(&global(archive.to_str()), args).unwrap();

        let table: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(table["instruments"], serde_json::json!(["AAA", "BBB"]));
        assert_eq!(table["rows"][0]["values"][0], serde_json::json!(1.0));
    }
}
