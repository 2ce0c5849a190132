//! Synthetic price archive generation.
//!
//! Produces one CSV per business day (`Ticker,Date,Price`), the same shape
//! the loader expects from a real archive. Prices follow a one-factor model:
//!
//! `r_i = beta_i * m + sigma_i * e_i`, with `m, e_i ~ N(0, 1)`-scaled daily shocks,
//!
//! so tickers with similar betas come out visibly correlated. Missing prices
//! and duplicate rows can be injected to exercise the cleaning step.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppError;

pub const DEFAULT_TICKERS: [&str; 10] = [
    "AAPL", "AMZN", "GOOG", "JNJ", "JPM", "META", "MSFT", "NVDA", "TSLA", "XOM",
];

/// Daily drift and volatility of the common market factor.
const MARKET_DRIFT: f64 = 0.0003;
const MARKET_VOL: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub tickers: Vec<String>,
    /// Number of business days to generate.
    pub days: usize,
    pub start: NaiveDate,
    pub seed: u64,
    /// Probability that a row is written with an empty price.
    pub missing_prob: f64,
    /// Probability that a row is followed by a conflicting duplicate.
    pub duplicate_prob: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            days: 120,
            start: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap_or_default(),
            seed: 42,
            missing_prob: 0.0,
            duplicate_prob: 0.0,
        }
    }
}

/// A generated row; `price: None` is written as an empty field.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub ticker: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SampleDay {
    pub date: NaiveDate,
    pub rows: Vec<SampleRow>,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub days: Vec<SampleDay>,
}

impl SampleDay {
    pub fn file_name(&self) -> String {
        format!("prices_{}.csv", self.date.format("%Y-%m-%d"))
    }
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.tickers.is_empty() {
        return Err(AppError::new(2, "Sample needs at least one ticker."));
    }
    if config.days == 0 {
        return Err(AppError::new(2, "Sample day count must be > 0."));
    }
    for (name, p) in [("missing", config.missing_prob), ("duplicate", config.duplicate_prob)] {
        if !(0.0..1.0).contains(&p) {
            return Err(AppError::new(2, format!("Invalid {name} probability {p} (must be in [0, 1)).")));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let betas: Vec<f64> = config.tickers.iter().map(|_| rng.gen_range(0.4..1.6)).collect();
    let vols: Vec<f64> = config.tickers.iter().map(|_| rng.gen_range(0.004..0.02)).collect();
    let mut prices: Vec<f64> = config.tickers.iter().map(|_| rng.gen_range(20.0..500.0)).collect();

    let mut days = Vec::with_capacity(config.days);
    let mut date = next_business_day(config.start);

    for day_idx in 0..config.days {
        if day_idx > 0 {
            date = next_business_day(date + Duration::days(1));
            let m = MARKET_DRIFT + MARKET_VOL * normal.sample(&mut rng);
            for i in 0..prices.len() {
                let r = betas[i] * m + vols[i] * normal.sample(&mut rng);
                prices[i] *= r.exp();
            }
        }

        let mut rows = Vec::with_capacity(config.tickers.len());
        for (ticker, &price) in config.tickers.iter().zip(&prices) {
            let price = round_cents(price);
            let written = if rng.gen_bool(config.missing_prob) { None } else { Some(price) };
            rows.push(SampleRow {
                ticker: ticker.clone(),
                price: written,
            });
            if rng.gen_bool(config.duplicate_prob) {
                rows.push(SampleRow {
                    ticker: ticker.clone(),
                    price: Some(round_cents(price * rng.gen_range(0.97..1.03))),
                });
            }
        }

        days.push(SampleDay { date, rows });
    }

    Ok(SampleData { days })
}

/// Write `data` to `path`: a ZIP archive if the path ends in `.zip`,
/// otherwise a directory of CSV files. Returns the number of files written.
pub fn write_sample(data: &SampleData, path: &Path) -> Result<usize, AppError> {
    let as_zip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        == Some(true);

    if as_zip {
        write_zip(data, path)?;
    } else {
        write_dir(data, path)?;
    }

    tracing::info!(path = %path.display(), files = data.days.len(), zip = as_zip, "wrote sample archive");
    Ok(data.days.len())
}

fn write_zip(data: &SampleData, path: &Path) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample archive '{}': {e}", path.display())))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for day in &data.days {
        zip.start_file(day.file_name(), options)
            .map_err(|e| AppError::new(2, format!("Failed to add '{}' to archive: {e}", day.file_name())))?;
        zip.write_all(&day_csv(day)?)
            .map_err(|e| AppError::new(2, format!("Failed to write '{}' to archive: {e}", day.file_name())))?;
    }

    zip.finish()
        .map_err(|e| AppError::new(2, format!("Failed to finalize sample archive: {e}")))?;
    Ok(())
}

fn write_dir(data: &SampleData, path: &Path) -> Result<(), AppError> {
    fs::create_dir_all(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample dir '{}': {e}", path.display())))?;
    for day in &data.days {
        let file_path = path.join(day.file_name());
        fs::write(&file_path, day_csv(day)?)
            .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", file_path.display())))?;
    }
    Ok(())
}

fn day_csv(day: &SampleDay) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let date = day.date.format("%Y-%m-%d").to_string();
    let err = |e: csv::Error| AppError::new(4, format!("Failed to encode sample CSV: {e}"));

    writer.write_record(["Ticker", "Date", "Price"]).map_err(err)?;
    for row in &day.rows {
        let price = row.price.map(|p| format!("{p:.2}")).unwrap_or_default();
        writer
            .write_record([row.ticker.as_str(), date.as_str(), price.as_str()])
            .map_err(err)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::new(4, format!("Failed to encode sample CSV: {e}")))
}

fn next_business_day(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

fn round_cents(p: f64) -> f64 {
    (p * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::load_dataset;

    fn config(days: usize) -> SampleConfig {
        SampleConfig {
            tickers: vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()],
            days,
            ..SampleConfig::default()
        }
    }

    #[test]
    fn same_seed_same_sample() {
        let a = generate_sample(&config(10)).unwrap();
        let b = generate_sample(&config(10)).unwrap();
        let prices = |s: &SampleData| -> Vec<Option<f64>> {
            s.days.iter().flat_map(|d| d.rows.iter().map(|r| r.price)).collect()
        };
        assert_eq!(prices(&a), prices(&b));
    }

    #[test]
    fn skips_weekends() {
        let sample = generate_sample(&config(10)).unwrap();
        assert!(sample
            .days
            .iter()
            .all(|d| !matches!(d.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(sample.days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(generate_sample(&SampleConfig { days: 0, ..config(1) }).is_err());
        assert!(generate_sample(&SampleConfig { missing_prob: 1.5, ..config(1) }).is_err());
        assert!(generate_sample(&SampleConfig { tickers: vec![], ..config(1) }).is_err());
    }

    #[test]
    fn zip_sample_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.zip");
        let sample = generate_sample(&config(30)).unwrap();
        assert_eq!(write_sample(&sample, &path).unwrap(), 30);

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.stats.resources_read, 30);
        assert_eq!(ds.stats.rows_kept, 90);
        assert_eq!(ds.returns.n_rows(), 29);
        assert_eq!(ds.valid_dates().len(), 9);
    }

    #[test]
    fn dirty_directory_sample_is_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("prices");
        let cfg = SampleConfig {
            missing_prob: 0.1,
            duplicate_prob: 0.2,
            ..config(40)
        };
        let sample = generate_sample(&cfg).unwrap();
        write_sample(&sample, &out).unwrap();

        let missing = sample.days.iter().flat_map(|d| &d.rows).filter(|r| r.price.is_none()).count();
        let ds = load_dataset(&out).unwrap();
        assert_eq!(ds.stats.dropped_missing, missing);
        assert!(ds.stats.duplicates_removed > 0);
        assert_eq!(
            ds.stats.rows_read,
            ds.stats.rows_kept + ds.stats.dropped_missing + ds.stats.duplicates_removed
        );
    }
}
