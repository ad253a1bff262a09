//! `mlx-experiments` library crate.
//!
//! Regression and neural-network experiments on simulated Ising spin systems
//! and MNIST digits. The binary (`mlx`) is a thin wrapper around this library so
//! that every experiment pipeline is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod experiments;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
