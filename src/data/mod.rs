//! Data sources other than real archives.
//!
//! - `sample`: seeded synthetic price archives for demos and tests

pub mod sample;

pub use sample::*;
