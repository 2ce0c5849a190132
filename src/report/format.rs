//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the engine stays free of display concerns
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::Dataset;
use crate::domain::{CorrelationOutcome, DISPLAY_DECIMALS, WINDOW_LEN};
use crate::engine::RollingPoint;
use crate::report::CorrelationTable;

/// Format the dataset summary (ingest counters + return matrix shape).
pub fn format_dataset_summary(dataset: &Dataset) -> String {
    let stats = &dataset.stats;
    let returns = &dataset.returns;
    let mut out = String::new();

    out.push_str("=== corrx - Stock Correlation Explorer ===\n");
    out.push_str(&format!("Source: {}\n", dataset.source.display()));
    out.push_str(&format!(
        "Rows: read={} | kept={} | missing={} | bad_date={} | duplicates={}\n",
        stats.rows_read, stats.rows_kept, stats.dropped_missing, stats.dropped_bad_date, stats.duplicates_removed
    ));
    out.push_str(&format!("Resources: {}\n", stats.resources_read));
    out.push_str(&format!(
        "Returns: {} dates x {} tickers\n",
        returns.n_rows(),
        returns.n_cols()
    ));

    match (returns.dates().first(), returns.dates().last()) {
        (Some(first), Some(last)) => out.push_str(&format!("Range: {first} .. {last}\n")),
        _ => out.push_str("Range: -\n"),
    }

    let valid = returns.valid_dates();
    match (valid.first(), valid.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Valid dates ({WINDOW_LEN}-day window): {} ({first} .. {last})\n",
            valid.len()
        )),
        _ => out.push_str(&format!("Valid dates ({WINDOW_LEN}-day window): none\n")),
    }

    out
}

/// Format a correlation query result: a heading plus the rounded table, or
/// the reason there is no data.
pub fn format_outcome(outcome: &CorrelationOutcome) -> String {
    match outcome {
        CorrelationOutcome::Empty(reason) => format!("No correlation data: {reason}\n"),
        CorrelationOutcome::Matrix(m) => {
            let mut out = format!(
                "{WINDOW_LEN}-day correlation as of {} (window {} .. {})\n\n",
                m.as_of, m.window_start, m.window_end
            );
            out.push_str(&format_correlation_table(&CorrelationTable::from_outcome(outcome)));
            out
        }
    }
}

/// Format a rounded correlation table with aligned columns.
pub fn format_correlation_table(table: &CorrelationTable) -> String {
    if table.is_empty() {
        return "(no data)\n".to_string();
    }

    let prec = DISPLAY_DECIMALS as usize;
    let label_w = table
        .instruments
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("ticker".len());
    let col_w = table
        .instruments
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(prec + 3);

    let mut out = String::new();
    let mut header = format!("{:<label_w$}", "ticker");
    for id in &table.instruments {
        header.push_str(&format!(" {id:>col_w$}"));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = "-".repeat(label_w);
    for _ in &table.instruments {
        rule.push(' ');
        rule.push_str(&"-".repeat(col_w));
    }
    out.push_str(&rule);
    out.push('\n');

    for row in &table.rows {
        let mut line = format!("{:<label_w$}", row.instrument);
        for v in &row.values {
            line.push_str(&format!(" {v:>col_w$.prec$}"));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// Format a rolling series as `date value` lines.
pub fn format_rolling(a: &str, b: &str, series: &[RollingPoint]) -> String {
    if series.is_empty() {
        return format!("No rolling correlation for {a}/{b}\n");
    }
    let prec = DISPLAY_DECIMALS as usize;
    let mut out = format!("{WINDOW_LEN}-day rolling correlation {a}/{b}\n");
    for p in series {
        out.push_str(&format!("{} {:>+.prec$}\n", p.date, p.value));
    }
    out
}
