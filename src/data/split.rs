//! Train/test splitting.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::AppError;

/// Regression data split into a head (train) and tail (test).
#[derive(Debug, Clone)]
pub struct RegressionSplit {
    pub x_train: DMatrix<f64>,
    pub y_train: DVector<f64>,
    pub x_test: DMatrix<f64>,
    pub y_test: DVector<f64>,
}

/// Use the first `⌊train · n⌋` rows for training and the remaining rows for testing.
///
/// The rows are generated independently at random, so no shuffle is needed.
pub fn split_head(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    train: f64,
) -> Result<RegressionSplit, AppError> {
    let n = x.nrows();
    if y.len() != n {
        return Err(AppError::data(format!(
            "Design matrix has {n} rows but target has {} entries.",
            y.len()
        )));
    }
    if !(train.is_finite() && train > 0.0 && train < 1.0) {
        return Err(AppError::usage(format!(
            "Training fraction must be in (0, 1) (got {train})."
        )));
    }

    let n_train = (train * n as f64).floor() as usize;
    if n_train == 0 || n_train == n {
        return Err(AppError::usage(format!(
            "Training fraction {train} of {n} samples leaves an empty train or test set."
        )));
    }
    let n_test = n - n_train;

    Ok(RegressionSplit {
        x_train: x.rows(0, n_train).into_owned(),
        y_train: y.rows(0, n_train).into_owned(),
        x_test: x.rows(n_train, n_test).into_owned(),
        y_test: y.rows(n_train, n_test).into_owned(),
    })
}

/// Rows and labels split into shuffled train and test parts.
#[derive(Debug, Clone)]
pub struct LabeledSplit<T, L> {
    pub train_rows: Vec<T>,
    pub train_labels: Vec<L>,
    pub test_rows: Vec<T>,
    pub test_labels: Vec<L>,
}

/// Shuffle `rows`/`labels` together and move `⌈test_size · n⌉` of them to the test side.
pub fn train_test_split<T, L, R: Rng>(
    rows: Vec<T>,
    labels: Vec<L>,
    test_size: f64,
    rng: &mut R,
) -> Result<LabeledSplit<T, L>, AppError> {
    if rows.len() != labels.len() {
        return Err(AppError::data(format!(
            "Got {} rows but {} labels.",
            rows.len(),
            labels.len()
        )));
    }
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::usage(format!("Test size must be in (0, 1) (got {test_size}).")));
    }

    let mut pairs: Vec<(T, L)> = rows.into_iter().zip(labels).collect();
    pairs.shuffle(rng);

    let n_test = (test_size * pairs.len() as f64).ceil() as usize;
    let n_train = pairs.len() - n_test.min(pairs.len());

    let test: Vec<(T, L)> = pairs.split_off(n_train);
    let (train_rows, train_labels) = pairs.into_iter().unzip();
    let (test_rows, test_labels) = test.into_iter().unzip();

    Ok(LabeledSplit {
        train_rows,
        train_labels,
        test_rows,
        test_labels,
    })
}

/// Stack equally long rows into a dense `f64` matrix (one row per sample).
pub fn rows_to_matrix<T>(rows: &[Vec<T>]) -> Result<DMatrix<f64>, AppError>
where
    T: Copy + Into<f64>,
{
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != width) {
        return Err(AppError::data("Rows have inconsistent lengths."));
    }
    Ok(DMatrix::from_fn(rows.len(), width, |r, c| rows[r][c].into()))
}
