//! Shared "load pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! price source -> ingest/clean -> return matrix
//!
//! The return matrix is built once and handed out behind an `Arc`, so every
//! correlation query (including parallel ones) reads the same immutable data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{IngestStats, ReturnMatrix};
use crate::engine::build_returns;
use crate::error::AppError;
use crate::io::ingest::load_path;

/// Everything the front-ends need after loading a price source.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub stats: IngestStats,
    pub returns: Arc<ReturnMatrix>,
}

impl Dataset {
    pub fn valid_dates(&self) -> &[NaiveDate] {
        self.returns.valid_dates()
    }

    pub fn instruments(&self) -> &[String] {
        self.returns.instruments()
    }

    /// Most recent date with a full window, if any.
    pub fn default_date(&self) -> Option<NaiveDate> {
        self.valid_dates().last().copied()
    }
}

/// Load `path` and build the return matrix.
pub fn load_dataset(path: &Path) -> Result<Dataset, AppError> {
    let table = load_path(path)?;
    let returns = build_returns(&table);

    tracing::info!(
        rows = returns.n_rows(),
        instruments = returns.n_cols(),
        valid_dates = returns.valid_dates().len(),
        "return matrix ready"
    );

    Ok(Dataset {
        source: path.to_path_buf(),
        stats: table.stats().clone(),
        returns: Arc::new(returns),
    })
}
