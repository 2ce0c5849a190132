//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the `--log-level` flag is used.
//! Logs go to stderr (or a file) so stdout stays clean for tables and CSV.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Where log lines should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// Drop everything (the TUI owns the terminal).
    Off,
}

pub fn init(level: &str, target: LogTarget<'_>) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create log file '{}': {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };

    result.map_err(|e| AppError::new(4, format!("Failed to initialise logging: {e}")))
}
