//! Rolling pairwise correlation across every valid date.
//!
//! Each date is an independent `correlate` query against the same shared
//! matrix, so the series is evaluated in parallel.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{CorrelationOutcome, ReturnMatrix};
use crate::engine::correlate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Trailing-window correlation of `a` and `b` at each valid date, ascending.
///
/// Dates where the query is empty are skipped.
pub fn rolling_pair(matrix: &ReturnMatrix, a: &str, b: &str) -> Vec<RollingPoint> {
    let pair = [a, b];
    matrix
        .valid_dates()
        .par_iter()
        .filter_map(|&date| match correlate(matrix, &pair, date) {
            CorrelationOutcome::Matrix(m) => Some(RollingPoint {
                date,
                value: m.values[(0, 1)],
            }),
            CorrelationOutcome::Empty(_) => None,
        })
        .collect()
}
