//! Domain types used throughout the experiment pipelines.
//!
//! This module defines:
//!
//! - experiment configurations (`LambdaSweepConfig`, `DigitsConfig`, ...)
//! - network and lattice settings shared between experiments
//! - report outputs (`Report`, `Figure`, `MetricRow`)

pub mod types;

pub use types::*;
