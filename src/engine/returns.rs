//! Return series builder.
//!
//! Pivots the cleaned table into a date × instrument price grid and takes the
//! row-over-row fractional change per column. Changes are aligned by grid
//! position: a gap in one instrument's prices makes the returns on both sides
//! of the gap undefined, it never reaches back to the last known price.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::domain::{CleanedPriceTable, ReturnMatrix};

/// Build the return matrix for `table`.
///
/// The first grid row (no predecessor) and any row where every return is
/// undefined are dropped.
pub fn build_returns(table: &CleanedPriceTable) -> ReturnMatrix {
    let dates: Vec<NaiveDate> = table
        .records()
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let instruments: Vec<String> = table
        .records()
        .iter()
        .map(|r| r.instrument.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let date_idx: HashMap<NaiveDate, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let col_idx: HashMap<&str, usize> = instruments
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut prices = vec![vec![None; instruments.len()]; dates.len()];
    for r in table.records() {
        // Both lookups succeed: the indexes were built from these records.
        if let (Some(&row), Some(&col)) = (date_idx.get(&r.date), col_idx.get(r.instrument.as_str())) {
            prices[row][col] = Some(r.price);
        }
    }

    let mut out_dates = Vec::with_capacity(dates.len().saturating_sub(1));
    let mut out_cells = Vec::with_capacity(dates.len().saturating_sub(1));
    for t in 1..dates.len() {
        let row: Vec<Option<f64>> = prices[t - 1]
            .iter()
            .zip(&prices[t])
            .map(|(prev, cur)| pct_change(*prev, *cur))
            .collect();
        if row.iter().all(Option::is_none) {
            continue;
        }
        out_dates.push(dates[t]);
        out_cells.push(row);
    }

    tracing::debug!(
        price_rows = dates.len(),
        return_rows = out_dates.len(),
        instruments = instruments.len(),
        "built return matrix"
    );

    ReturnMatrix::from_parts(out_dates, instruments, out_cells)
}

/// Fractional change from `prev` to `cur`.
///
/// Undefined when either price is missing or `prev` is zero.
pub fn pct_change(prev: Option<f64>, cur: Option<f64>) -> Option<f64> {
    let (prev, cur) = (prev?, cur?);
    if prev == 0.0 {
        return None;
    }
    let r = (cur - prev) / prev;
    r.is_finite().then_some(r)
}
