//! Presentation boundary: rounded correlation tables and terminal formatting.
//!
//! The engine returns full-precision values. Rounding to `DISPLAY_DECIMALS`
//! happens here and nowhere else.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{CorrelationOutcome, DISPLAY_DECIMALS};

pub mod format;

pub use format::*;

/// One row of a correlation table: an instrument and its correlations with
/// every column instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRow {
    pub instrument: String,
    pub values: Vec<f64>,
}

/// Instrument × instrument table of rounded correlations.
///
/// An empty outcome becomes a table with no columns and no rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationTable {
    pub as_of: Option<NaiveDate>,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub instruments: Vec<String>,
    pub rows: Vec<CorrelationRow>,
}

impl CorrelationTable {
    pub fn empty() -> Self {
        Self {
            as_of: None,
            window_start: None,
            window_end: None,
            instruments: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn from_outcome(outcome: &CorrelationOutcome) -> Self {
        let Some(m) = outcome.matrix() else {
            return Self::empty();
        };

        let rows = m
            .instruments
            .iter()
            .enumerate()
            .map(|(i, id)| CorrelationRow {
                instrument: id.clone(),
                values: (0..m.len())
                    .map(|j| round_to(m.values[(i, j)], DISPLAY_DECIMALS))
                    .collect(),
            })
            .collect();

        Self {
            as_of: Some(m.as_of),
            window_start: Some(m.window_start),
            window_end: Some(m.window_end),
            instruments: m.instruments.clone(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Round half-to-even to `decimals` places. Negative zero is normalized.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round_ties_even() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}
