//! `corr-explorer` library crate.
//!
//! The binary (`corrx`) is a thin wrapper around this library so that:
//!
//! - ingest, return building and correlation are testable without spawning processes
//! - the CLI and the TUI share one load pipeline
//! - the engine can be reused by other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
pub mod tui;
