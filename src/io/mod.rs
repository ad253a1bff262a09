//! Input/output helpers.
//!
//! - report JSON read/write (`results`)

pub mod results;

pub use results::*;
