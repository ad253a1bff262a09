//! Mathematical utilities: least squares solves, grids, and label encodings.

pub mod encoding;
pub mod ols;
pub mod spacing;

pub use encoding::*;
pub use ols::*;
pub use spacing::*;
