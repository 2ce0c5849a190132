//! The return/correlation engine.
//!
//! - `returns`: cleaned prices → dense return grid
//! - `correlation`: trailing-window Pearson matrix for one query
//! - `rolling`: one pair's correlation across every valid date

pub mod correlation;
pub mod returns;
pub mod rolling;

pub use correlation::*;
pub use returns::*;
pub use rolling::*;
