//! Windowed correlation engine.
//!
//! A query is `(instruments, as_of)`. The window is the `WINDOW_LEN` return
//! rows strictly before `as_of`; the `as_of` row itself is not included.
//!
//! Queries never fail: every invalid input maps to
//! `CorrelationOutcome::Empty` with a reason. The engine only reads the
//! matrix, so queries can run concurrently against a shared handle.

use chrono::NaiveDate;
use nalgebra::DMatrix;

use crate::domain::{CorrelationMatrix, CorrelationOutcome, EmptyReason, ReturnMatrix, WINDOW_LEN};
use crate::math::pearson;

/// Correlation matrix of `instruments` over the window ending just before `as_of`.
///
/// Duplicate ids are collapsed (first occurrence wins); rows and columns of the
/// result follow the request order. Undefined coefficients are reported as 0,
/// and the diagonal is always 1.
pub fn correlate<S: AsRef<str>>(matrix: &ReturnMatrix, instruments: &[S], as_of: NaiveDate) -> CorrelationOutcome {
    let mut requested: Vec<&str> = Vec::with_capacity(instruments.len());
    for id in instruments {
        let id = id.as_ref();
        if !requested.contains(&id) {
            requested.push(id);
        }
    }
    if requested.len() < 2 {
        return CorrelationOutcome::Empty(EmptyReason::TooFewInstruments {
            requested: requested.len(),
        });
    }

    let Some(position) = matrix.position(as_of) else {
        return CorrelationOutcome::Empty(EmptyReason::UnknownDate(as_of));
    };
    if position < WINDOW_LEN {
        return CorrelationOutcome::Empty(EmptyReason::InsufficientHistory {
            position,
            window: WINDOW_LEN,
        });
    }

    let mut columns = Vec::with_capacity(requested.len());
    for id in &requested {
        match matrix.column(id) {
            Some(col) => columns.push(col),
            None => return CorrelationOutcome::Empty(EmptyReason::UnknownInstrument(id.to_string())),
        }
    }

    let start = position - WINDOW_LEN;
    let window: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|&col| (start..position).map(|row| matrix.get(row, col)).collect())
        .collect();

    let k = window.len();
    let mut values = DMatrix::<f64>::identity(k, k);
    for i in 0..k {
        for j in (i + 1)..k {
            let r = pearson(&window[i], &window[j]).unwrap_or(0.0);
            values[(i, j)] = r;
            values[(j, i)] = r;
        }
    }

    let dates = matrix.dates();
    tracing::debug!(%as_of, instruments = k, window_start = %dates[start], "computed correlation window");

    CorrelationOutcome::Matrix(CorrelationMatrix {
        as_of,
        window_start: dates[start],
        window_end: dates[position - 1],
        instruments: requested.into_iter().map(str::to_string).collect(),
        values,
    })
}

/// Same as [`correlate`], taking the date as a `YYYY-MM-DD` string.
pub fn correlate_str<S: AsRef<str>>(matrix: &ReturnMatrix, instruments: &[S], as_of: &str) -> CorrelationOutcome {
    match NaiveDate::parse_from_str(as_of.trim(), "%Y-%m-%d") {
        Ok(date) => correlate(matrix, instruments, date),
        Err(_) => CorrelationOutcome::Empty(EmptyReason::InvalidDate(as_of.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CleanedPriceTable, PriceRecord};
    use crate::engine::build_returns;

    use proptest::prelude::*;

    const DATES: [&str; 22] = [
        "2025-07-01", "2025-07-02", "2025-07-03", "2025-07-04", "2025-07-07", "2025-07-08", "2025-07-09",
        "2025-07-10", "2025-07-11", "2025-07-14", "2025-07-15", "2025-07-16", "2025-07-17", "2025-07-18",
        "2025-07-21", "2025-07-22", "2025-07-23", "2025-07-24", "2025-07-25", "2025-07-28", "2025-07-29",
        "2025-07-30",
    ];
    const MSFT: [f64; 22] = [
        410.0, 412.5, 415.0, 413.0, 416.0, 418.0, 420.0, 422.5, 421.0, 423.0, 425.0, 427.5, 429.0, 431.0, 433.0,
        435.0, 437.5, 439.0, 440.0, 442.0, 444.0, 445.0,
    ];
    const TSLA: [f64; 22] = [
        680.0, 685.0, 690.0, 688.0, 692.0, 695.0, 698.0, 700.0, 702.5, 705.0, 707.0, 710.0, 712.0, 715.0, 718.0,
        720.0, 723.0, 725.0, 728.0, 730.0, 732.0, 733.0,
    ];

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_returns() -> ReturnMatrix {
        let mut records = Vec::new();
        for (i, d) in DATES.iter().enumerate() {
            records.push(PriceRecord::new("MSFT", date(d), MSFT[i]));
            records.push(PriceRecord::new("TSLA", date(d), TSLA[i]));
        }
        build_returns(&CleanedPriceTable::from_records(records))
    }

    #[test]
    fn sample_has_21_return_rows() {
        assert_eq!(sample_returns().n_rows(), 21);
    }

    #[test]
    fn last_date_gives_2x2_matrix() {
        let returns = sample_returns();
        let last = *returns.dates().last().unwrap();
        let outcome = correlate(&returns, &["MSFT", "TSLA"], last);
        let m = outcome.matrix().expect("matrix");

        assert_eq!(m.values.shape(), (2, 2));
        assert_eq!(m.instruments, vec!["MSFT", "TSLA"]);
        assert_eq!(m.values[(0, 0)], 1.0);
        assert_eq!(m.values[(1, 1)], 1.0);
        assert_eq!(m.values[(0, 1)], m.values[(1, 0)]);
        assert!(m.values[(0, 1)] > 0.0 && m.values[(0, 1)] <= 1.0);
        // Window excludes the as-of row.
        assert_eq!(m.window_end, returns.dates()[19]);
        assert_eq!(m.window_start, returns.dates()[0]);
    }

    #[test]
    fn request_order_is_preserved() {
        let returns = sample_returns();
        let last = *returns.dates().last().unwrap();
        let outcome = correlate(&returns, &["TSLA", "MSFT"], last);
        assert_eq!(outcome.matrix().unwrap().instruments, vec!["TSLA", "MSFT"]);
    }

    #[test]
    fn short_history_is_empty() {
        let returns = sample_returns();
        for pos in [0usize, 5, 19] {
            let outcome = correlate(&returns, &["MSFT", "TSLA"], returns.dates()[pos]);
            assert_eq!(
                outcome,
                CorrelationOutcome::Empty(EmptyReason::InsufficientHistory { position: pos, window: WINDOW_LEN })
            );
        }
    }

    #[test]
    fn two_price_days_is_empty() {
        let records = vec![
            PriceRecord::new("MSFT", date(DATES[0]), MSFT[0]),
            PriceRecord::new("TSLA", date(DATES[0]), TSLA[0]),
            PriceRecord::new("MSFT", date(DATES[1]), MSFT[1]),
            PriceRecord::new("TSLA", date(DATES[1]), TSLA[1]),
        ];
        let returns = build_returns(&CleanedPriceTable::from_records(records));
        let last = *returns.dates().last().unwrap();
        assert!(correlate(&returns, &["MSFT", "TSLA"], last).is_empty());
    }

    #[test]
    fn too_few_instruments_is_empty() {
        let returns = sample_returns();
        let last = *returns.dates().last().unwrap();
        assert_eq!(
            correlate(&returns, &["MSFT"], last),
            CorrelationOutcome::Empty(EmptyReason::TooFewInstruments { requested: 1 })
        );
        assert!(correlate(&returns, &["MSFT", "MSFT"], last).is_empty());
        assert!(correlate::<&str>(&returns, &[], last).is_empty());
    }

    #[test]
    fn unknown_date_and_instrument_are_empty() {
        let returns = sample_returns();
        let last = *returns.dates().last().unwrap();
        assert_eq!(
            correlate(&returns, &["MSFT", "TSLA"], date("2025-07-05")),
            CorrelationOutcome::Empty(EmptyReason::UnknownDate(date("2025-07-05")))
        );
        assert_eq!(
            correlate(&returns, &["MSFT", "AAPL"], last),
            CorrelationOutcome::Empty(EmptyReason::UnknownInstrument("AAPL".to_string()))
        );
        assert_eq!(
            correlate_str(&returns, &["MSFT", "TSLA"], "July 30"),
            CorrelationOutcome::Empty(EmptyReason::InvalidDate("July 30".to_string()))
        );
        assert!(!correlate_str(&returns, &["MSFT", "TSLA"], "2025-07-30").is_empty());
    }

    #[test]
    fn zero_variance_column_reads_as_zero_with_unit_diagonal() {
        let mut records = Vec::new();
        for (i, d) in DATES.iter().enumerate() {
            records.push(PriceRecord::new("FLAT", date(d), 100.0));
            records.push(PriceRecord::new("MSFT", date(d), MSFT[i]));
        }
        let returns = build_returns(&CleanedPriceTable::from_records(records));
        let last = *returns.dates().last().unwrap();
        let outcome = correlate(&returns, &["FLAT", "MSFT"], last);
        let m = outcome.matrix().unwrap();
        assert_eq!(m.values[(0, 0)], 1.0);
        assert_eq!(m.values[(0, 1)], 0.0);
        assert_eq!(m.values[(1, 0)], 0.0);
    }

    #[test]
    fn zero_price_does_not_leak_nan() {
        let mut records = Vec::new();
        for (i, d) in DATES.iter().enumerate() {
            let p = if i == 5 { 0.0 } else { MSFT[i] };
            records.push(PriceRecord::new("MSFT", date(d), p));
            records.push(PriceRecord::new("TSLA", date(d), TSLA[i]));
        }
        let returns = build_returns(&CleanedPriceTable::from_records(records));
        let msft = returns.column("MSFT").unwrap();
        // Row 5 in returns is the transition out of the zero price (grid row 6).
        assert_eq!(returns.get(5, msft), None);

        let last = *returns.dates().last().unwrap();
        let outcome = correlate(&returns, &["MSFT", "TSLA"], last);
        let m = outcome.matrix().unwrap();
        assert!(m.values.iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v)));
    }

    fn arb_prices() -> impl Strategy<Value = Vec<[f64; 3]>> {
        prop::collection::vec([1.0..200.0_f64, 1.0..200.0_f64, 1.0..200.0_f64], 22..40)
    }

    proptest! {
        #[test]
        fn matrices_are_symmetric_with_unit_diagonal(prices in arb_prices()) {
            let start = date("2025-01-01");
            let mut records = Vec::new();
            for (i, row) in prices.iter().enumerate() {
                let d = start + chrono::Duration::days(i as i64);
                for (t, p) in ["A", "B", "C"].iter().zip(row) {
                    records.push(PriceRecord::new(*t, d, *p));
                }
            }
            let returns = build_returns(&CleanedPriceTable::from_records(records));
            for &as_of in returns.valid_dates() {
                let outcome = correlate(&returns, &["C", "A", "B"], as_of);
                let m = outcome.matrix().unwrap();
                for i in 0..3 {
                    prop_assert_eq!(m.values[(i, i)], 1.0);
                    for j in 0..3 {
                        prop_assert_eq!(m.values[(i, j)], m.values[(j, i)]);
                        prop_assert!((-1.0..=1.0).contains(&m.values[(i, j)]));
                    }
                }
            }
        }
    }
}
