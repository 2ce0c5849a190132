//! Error types.
//!
//! Two layers:
//!
//! - [`ResourceError`] is the only error the core pipeline lets escape: the
//!   price source could not be opened or read at the container level.
//! - [`AppError`] is what the binary reports. It carries the process exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Container-level failure while reading a price source.
///
/// Row-level problems (missing prices, bad dates) never surface here; they are
/// filtered during cleaning.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to open price source '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' is not a readable archive: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to read resource '{name}': {message}")]
    Entry { name: String, message: String },
    #[error("malformed CSV in resource '{name}': {source}")]
    Csv {
        name: String,
        #[source]
        source: csv::Error,
    },
    #[error("no .csv resources found in '{}'", path.display())]
    NoResources { path: PathBuf },
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_maps_to_exit_code_2() {
        let err = ResourceError::NoResources {
            path: PathBuf::from("empty.zip"),
        };
        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 2);
        assert!(app.to_string().contains("empty.zip"));
    }
}
