//! Dataset generation, loading and splitting.
//!
//! - 1D Ising chains and their pairwise design matrix (`ising`)
//! - 2D Ising Monte Carlo configurations (`lattice`)
//! - the on-disk sample cache for the 2D configurations (`cache`)
//! - MNIST loading and shift augmentation (`digits`)
//! - train/test splitting helpers (`split`)

pub mod cache;
pub mod digits;
pub mod ising;
pub mod lattice;
pub mod split;

pub use cache::{IsingSamples, load_ising_smaller, save_ising_smaller};
pub use digits::{DigitImages, DigitSplit};
pub use ising::{RegressionData, generate_regression_data};
pub use split::{LabeledSplit, RegressionSplit, rows_to_matrix, split_head, train_test_split};
