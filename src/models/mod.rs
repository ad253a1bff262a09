//! Estimators used by the experiments.
//!
//! - `least_squares`: OLS / Ridge / Lasso linear regression without intercept
//! - `network`: a dense feed-forward classifier trained with SGD or Adam
//! - `activation`: activation and cost functions for the network

pub mod activation;
pub mod least_squares;
pub mod network;

pub use activation::{Activation, Cost};
pub use least_squares::{LeastSquares, Method};
pub use network::{FitOptions, NeuralNetwork, Optimizer, TrainingHistory};
