//! Reporting utilities: error metrics and formatted terminal output.

pub mod format;

use nalgebra::DVector;

use crate::error::AppError;

pub use format::{format_metrics_table, format_report};

fn check_lengths(n_true: usize, n_pred: usize) -> Result<(), AppError> {
    if n_true != n_pred {
        return Err(AppError::data(format!(
            "Metric inputs differ in length ({n_true} vs {n_pred})."
        )));
    }
    if n_true == 0 {
        return Err(AppError::data("Metric inputs are empty."));
    }
    Ok(())
}

/// Mean squared error.
pub fn mse(y: &DVector<f64>, y_pred: &DVector<f64>) -> Result<f64, AppError> {
    check_lengths(y.len(), y_pred.len())?;
    Ok((y - y_pred).norm_squared() / y.len() as f64)
}

/// Coefficient of determination `1 − SS_res / SS_tot`.
///
/// A constant target (`SS_tot = 0`) scores 1 for a perfect prediction and 0 otherwise.
pub fn r2(y: &DVector<f64>, y_pred: &DVector<f64>) -> Result<f64, AppError> {
    check_lengths(y.len(), y_pred.len())?;
    let mean = y.mean();
    let ss_res = (y - y_pred).norm_squared();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Share of positions where the labels agree.
pub fn accuracy<T: PartialEq>(y: &[T], y_pred: &[T]) -> Result<f64, AppError> {
    check_lengths(y.len(), y_pred.len())?;
    let hits = y.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    Ok(hits as f64 / y.len() as f64)
}
