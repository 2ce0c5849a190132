//! Shared domain types.
//!
//! The pipeline moves strictly forward through these types:
//!
//! `PriceRecord` → `CleanedPriceTable` → `ReturnMatrix` → `CorrelationOutcome`
//!
//! Everything after ingestion is immutable once built.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::Serialize;

/// Number of return rows in the trailing correlation window.
pub const WINDOW_LEN: usize = 20;

/// Decimal places used when correlation values are shown or exported.
pub const DISPLAY_DECIMALS: u32 = 3;

/// A single validated price observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub instrument: String,
    pub date: NaiveDate,
    pub price: f64,
}

impl PriceRecord {
    pub fn new(instrument: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            instrument: instrument.into(),
            date,
            price,
        }
    }
}

/// Counters collected while cleaning a price source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub resources_read: usize,
    pub rows_read: usize,
    /// Rows without a usable instrument id or price.
    pub dropped_missing: usize,
    /// Rows whose date could not be parsed.
    pub dropped_bad_date: usize,
    pub duplicates_removed: usize,
    pub rows_kept: usize,
}

/// Price records with at most one entry per `(instrument, date)`.
///
/// The only way to build one is [`CleanedPriceTable::from_records`], which
/// enforces the uniqueness invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPriceTable {
    records: Vec<PriceRecord>,
    stats: IngestStats,
}

impl CleanedPriceTable {
    /// Deduplicate `records` on `(instrument, date)`, keeping the first
    /// occurrence in iteration order.
    pub fn from_records(records: impl IntoIterator<Item = PriceRecord>) -> Self {
        let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();
        let mut kept = Vec::new();
        let mut duplicates_removed = 0usize;
        let mut rows_read = 0usize;

        for record in records {
            rows_read += 1;
            if seen.insert((record.date, record.instrument.clone())) {
                kept.push(record);
            } else {
                duplicates_removed += 1;
            }
        }

        let stats = IngestStats {
            rows_read,
            duplicates_removed,
            rows_kept: kept.len(),
            ..IngestStats::default()
        };

        Self {
            records: kept,
            stats,
        }
    }

    /// Replace the source-level counters (resources, dropped rows) while keeping
    /// the dedup counters computed by [`CleanedPriceTable::from_records`].
    pub(crate) fn with_source_stats(mut self, resources_read: usize, rows_read: usize, dropped_missing: usize, dropped_bad_date: usize) -> Self {
        self.stats.resources_read = resources_read;
        self.stats.rows_read = rows_read;
        self.stats.dropped_missing = dropped_missing;
        self.stats.dropped_bad_date = dropped_bad_date;
        self
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Dense date × instrument grid of fractional returns.
///
/// Rows are strictly increasing dates; columns are instrument ids in sorted
/// order. `None` marks an undefined return (no price on this row or the row
/// before it, or a zero prior price).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    instruments: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl ReturnMatrix {
    /// Callers guarantee sorted, unique dates and instruments and a
    /// `dates.len() × instruments.len()` cell grid.
    pub(crate) fn from_parts(dates: Vec<NaiveDate>, instruments: Vec<String>, cells: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert_eq!(dates.len(), cells.len());
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self {
            dates,
            instruments,
            cells,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Zero-based row position of `date`.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Column index of `instrument`.
    pub fn column(&self, instrument: &str) -> Option<usize> {
        self.instruments
            .binary_search_by(|probe| probe.as_str().cmp(instrument))
            .ok()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn row(&self, row: usize) -> Option<&[Option<f64>]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    /// Dates with a full trailing window behind them.
    pub fn valid_dates(&self) -> &[NaiveDate] {
        self.dates.get(WINDOW_LEN..).unwrap_or(&[])
    }
}

/// A computed correlation matrix for one `(as_of, instruments)` query.
///
/// Values are full precision; rounding happens in `report`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub as_of: NaiveDate,
    /// First and last return dates inside the window (both inclusive).
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Row/column labels, in request order.
    pub instruments: Vec<String>,
    pub values: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Correlation between two labelled instruments.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.instruments.iter().position(|s| s == a)?;
        let j = self.instruments.iter().position(|s| s == b)?;
        Some(self.values[(i, j)])
    }
}

/// Why a correlation query produced no matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    TooFewInstruments { requested: usize },
    InvalidDate(String),
    UnknownDate(NaiveDate),
    InsufficientHistory { position: usize, window: usize },
    UnknownInstrument(String),
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::TooFewInstruments { requested } => {
                write!(f, "select at least 2 tickers (got {requested})")
            }
            EmptyReason::InvalidDate(raw) => write!(f, "invalid date '{raw}' (expected YYYY-MM-DD)"),
            EmptyReason::UnknownDate(date) => write!(f, "no return row for {date}"),
            EmptyReason::InsufficientHistory { position, window } => write!(
                f,
                "not enough history: {position} prior return rows, need {window}"
            ),
            EmptyReason::UnknownInstrument(id) => write!(f, "unknown ticker '{id}'"),
        }
    }
}

/// Result of a correlation query: either a matrix or an explicit no-data state.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelationOutcome {
    Matrix(CorrelationMatrix),
    Empty(EmptyReason),
}

impl CorrelationOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, CorrelationOutcome::Empty(_))
    }

    pub fn matrix(&self) -> Option<&CorrelationMatrix> {
        match self {
            CorrelationOutcome::Matrix(m) => Some(m),
            CorrelationOutcome::Empty(_) => None,
        }
    }
}
