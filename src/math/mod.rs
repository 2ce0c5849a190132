//! Mathematical utilities: correlation over sparse return columns.

pub mod pearson;

pub use pearson::*;
