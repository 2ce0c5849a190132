//! Input/output helpers.
//!
//! - price sources: ZIP archives or directories of CSVs (`source`)
//! - CSV ingest + cleaning (`ingest`)
//! - table and rolling-series exports (`export`)

pub mod export;
pub mod ingest;
pub mod source;

pub use export::*;
pub use ingest::*;
pub use source::*;
