//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated price observations and the cleaned table (`PriceRecord`, `CleanedPriceTable`)
//! - the dense return grid (`ReturnMatrix`)
//! - correlation query outputs (`CorrelationMatrix`, `CorrelationOutcome`, `EmptyReason`)

pub mod types;

pub use types::*;
