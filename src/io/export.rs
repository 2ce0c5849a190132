//! Export correlation tables and rolling series.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. Values are already rounded by `report`.

use std::fs::File;
use std::path::Path;

use crate::engine::RollingPoint;
use crate::error::AppError;
use crate::report::CorrelationTable;

/// Write a correlation table as CSV: `ticker,<id>,<id>,...` then one row per id.
pub fn write_table_csv(path: &Path, table: &CorrelationTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["ticker".to_string()];
    header.extend(table.instruments.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in &table.rows {
        let mut record = vec![row.instrument.clone()];
        record.extend(row.values.iter().map(|v| v.to_string()));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write a correlation table as pretty JSON.
pub fn write_table_json(path: &Path, table: &CorrelationTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, table)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

/// Write a rolling series as CSV with a `date,value` header.
pub fn write_rolling_csv(path: &Path, series: &[RollingPoint]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    for point in series {
        writer
            .serialize(point)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
