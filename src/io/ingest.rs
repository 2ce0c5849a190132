//! CSV ingest and cleaning.
//!
//! This module turns a price source (ZIP or directory of per-day CSVs) into a
//! `CleanedPriceTable`.
//!
//! Design goals:
//! - **Fail fast on the container**: an unreadable source is a `ResourceError`
//! - **Fail soft on rows**: missing tickers/prices and bad dates are dropped and counted
//! - **Deterministic behavior**: resources in name order, first duplicate wins
//! - **Separation of concerns**: no return or correlation logic here

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{CleanedPriceTable, PriceRecord};
use crate::error::ResourceError;
use crate::io::source::{PriceSource, Resource};

/// Tokens treated as a missing value, in any column.
const NA_TOKENS: [&str; 10] = ["", "na", "n/a", "#n/a", "#na", "nan", "-nan", "null", "none", "<na>"];

/// A row as it appears in a resource, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub instrument: Option<String>,
    pub date: Option<String>,
    pub price: Option<f64>,
}

/// Load and clean all price resources at `path`.
pub fn load_path(path: &Path) -> Result<CleanedPriceTable, ResourceError> {
    let source = PriceSource::from_path(path)?;
    load(&source)
}

/// Load and clean all price resources from `source`.
pub fn load(source: &PriceSource) -> Result<CleanedPriceTable, ResourceError> {
    let resources = source.read_resources()?;

    let mut rows = Vec::new();
    for resource in &resources {
        let before = rows.len();
        read_rows(resource, &mut rows)?;
        tracing::debug!(resource = %resource.name, rows = rows.len() - before, "parsed resource");
    }

    let table = clean_rows(rows, resources.len());
    let stats = table.stats();
    tracing::info!(
        source = %source.path().display(),
        resources = stats.resources_read,
        rows_read = stats.rows_read,
        dropped_missing = stats.dropped_missing,
        dropped_bad_date = stats.dropped_bad_date,
        duplicates = stats.duplicates_removed,
        kept = stats.rows_kept,
        "loaded price source"
    );
    Ok(table)
}

/// Apply the cleaning steps to concatenated raw rows:
/// drop missing ticker/price, drop unparseable dates, then dedup on
/// `(date, ticker)` keeping the first occurrence.
pub fn clean_rows(rows: Vec<RawRow>, resources_read: usize) -> CleanedPriceTable {
    let rows_read = rows.len();
    let mut dropped_missing = 0usize;
    let mut dropped_bad_date = 0usize;
    let mut valid = Vec::with_capacity(rows.len());

    for row in rows {
        let (Some(instrument), Some(price)) = (row.instrument, row.price) else {
            dropped_missing += 1;
            continue;
        };
        let Some(date) = row.date.as_deref().and_then(parse_date) else {
            dropped_bad_date += 1;
            continue;
        };
        valid.push(PriceRecord {
            instrument,
            date,
            price,
        });
    }

    CleanedPriceTable::from_records(valid).with_source_stats(
        resources_read,
        rows_read,
        dropped_missing,
        dropped_bad_date,
    )
}

/// Parse one CSV resource into raw rows, appending to `out`.
pub fn read_rows(resource: &Resource, out: &mut Vec<RawRow>) -> Result<(), ResourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(resource.bytes.as_slice());

    let headers = reader
        .headers()
        .map_err(|source| ResourceError::Csv {
            name: resource.name.clone(),
            source,
        })?
        .clone();
    let header_map = build_header_map(&headers);

    for column in ["ticker", "date", "price"] {
        if !header_map.contains_key(column) {
            tracing::warn!(resource = %resource.name, column, "resource is missing a required column; its rows will be dropped");
        }
    }

    for result in reader.records() {
        let record = result.map_err(|source| ResourceError::Csv {
            name: resource.name.clone(),
            source,
        })?;
        out.push(RawRow {
            instrument: get_field(&record, &header_map, "ticker").map(str::to_string),
            date: get_field(&record, &header_map, "date").map(str::to_string),
            price: get_field(&record, &header_map, "price").and_then(parse_price),
        });
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First column wins if a header is repeated.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_field<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !is_na(s))
}

fn is_na(s: &str) -> bool {
    NA_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

fn parse_price(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Parse a date field. ISO dates are expected; a few other common layouts
/// (and ISO timestamps, truncated to the date) are accepted.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    let s = s.trim();
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}
