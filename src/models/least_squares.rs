//! Linear least squares with optional shrinkage.
//!
//! All three methods fit `y ≈ Xβ` without an intercept column:
//!
//! - OLS: minimum-norm least squares via SVD
//! - Ridge: `min ‖y − Xβ‖² + λ‖β‖²` via SVD
//! - Lasso: `min (1/2n)‖y − Xβ‖² + λ‖β‖₁` via cyclic coordinate descent
//!   (same objective scaling as scikit-learn's `Lasso(alpha=λ)`)

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::math::{solve_least_squares, solve_ridge};

/// Coordinate descent iteration cap.
const LASSO_MAX_ITER: usize = 1000;
/// Stop when the largest coefficient update is below `tol · max|β|`.
const LASSO_TOL: f64 = 1e-4;

/// Regularization flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Ols,
    Ridge,
    Lasso,
}

impl Method {
    pub fn display_name(self) -> &'static str {
        match self {
            Method::Ols => "OLS",
            Method::Ridge => "Ridge",
            Method::Lasso => "Lasso",
        }
    }
}

/// A linear regressor; `fit` stores the coefficients used by `predict`.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    method: Method,
    lambda: f64,
    beta: Option<DVector<f64>>,
}

impl LeastSquares {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            lambda: 0.0,
            beta: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Set the shrinkage strength (ignored by OLS).
    pub fn set_lambda(&mut self, lambda: f64) -> Result<(), AppError> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(AppError::usage(format!(
                "Shrinkage parameter must be finite and >= 0 (got {lambda})."
            )));
        }
        self.lambda = lambda;
        Ok(())
    }

    pub fn with_lambda(mut self, lambda: f64) -> Result<Self, AppError> {
        self.set_lambda(lambda)?;
        Ok(self)
    }

    /// Fitted coefficients, if `fit` has succeeded.
    pub fn beta(&self) -> Option<&DVector<f64>> {
        self.beta.as_ref()
    }

    /// Fit the coefficients and return a copy of them.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>, AppError> {
        if x.nrows() != y.len() {
            return Err(AppError::data(format!(
                "Design matrix has {} rows but target has {} entries.",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(AppError::data("Cannot fit an empty design matrix."));
        }

        let beta = match self.method {
            Method::Ols => solve_least_squares(x, y),
            Method::Ridge => solve_ridge(x, y, self.lambda),
            Method::Lasso => Some(lasso_coordinate_descent(x, y, self.lambda)),
        }
        .ok_or_else(|| {
            AppError::runtime(format!(
                "{} solve failed (ill-conditioned design matrix, λ={}).",
                self.method.display_name(),
                self.lambda
            ))
        })?;

        self.beta = Some(beta.clone());
        Ok(beta)
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        let Some(beta) = &self.beta else {
            return Err(AppError::usage("Model must be fitted before predicting."));
        };
        if x.ncols() != beta.len() {
            return Err(AppError::data(format!(
                "Model has {} coefficients but input has {} columns.",
                beta.len(),
                x.ncols()
            )));
        }
        Ok(x * beta)
    }
}

fn soft_threshold(v: f64, threshold: f64) -> f64 {
    if v > threshold {
        v - threshold
    } else if v < -threshold {
        v + threshold
    } else {
        0.0
    }
}

/// Cyclic coordinate descent with a maintained residual `r = y − Xβ`.
fn lasso_coordinate_descent(x: &DMatrix<f64>, y: &DVector<f64>, lambda: f64) -> DVector<f64> {
    let (n, p) = x.shape();
    let threshold = lambda * n as f64;
    let col_sq: Vec<f64> = x.column_iter().map(|c| c.norm_squared()).collect();

    let mut beta = DVector::zeros(p);
    let mut residual = y.clone();

    for iter in 0..LASSO_MAX_ITER {
        let mut max_delta = 0.0_f64;
        let mut max_beta = 0.0_f64;

        for j in 0..p {
            if col_sq[j] == 0.0 {
                continue;
            }
            let col = x.column(j);
            let old = beta[j];
            let rho = col.dot(&residual) + col_sq[j] * old;
            let new = soft_threshold(rho, threshold) / col_sq[j];

            if new != old {
                residual.axpy(old - new, &col, 1.0);
                beta[j] = new;
            }
            max_delta = max_delta.max((new - old).abs());
            max_beta = max_beta.max(new.abs());
        }

        if max_beta == 0.0 || max_delta / max_beta < LASSO_TOL {
            debug!(iterations = iter + 1, lambda, "lasso converged");
            return beta;
        }
    }

    debug!(lambda, "lasso reached the iteration cap");
    beta
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::data::ising::generate_regression_data;

    fn toy_problem() -> (DMatrix<f64>, DVector<f64>) {
        // y = 3 x0 - 2 x1, x2 irrelevant.
        let x = DMatrix::from_row_slice(
            6,
            3,
            &[
                1.0, 0.0, 0.3, //
                0.0, 1.0, -0.2, //
                1.0, 1.0, 0.1, //
                2.0, -1.0, 0.0, //
                -1.0, 2.0, 0.5, //
                0.5, 0.5, -0.4,
            ],
        );
        let y = DVector::from_iterator(6, x.row_iter().map(|r| 3.0 * r[0] - 2.0 * r[1]));
        (x, y)
    }

    #[test]
    fn ols_recovers_exact_coefficients() {
        let (x, y) = toy_problem();
        let mut ols = LeastSquares::new(Method::Ols);
        let beta = ols.fit(&x, &y).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-9);
        assert!((beta[1] + 2.0).abs() < 1e-9);
        assert!(beta[2].abs() < 1e-9);
    }

    #[test]
    fn lasso_with_small_lambda_matches_ols() {
        let (x, y) = toy_problem();
        let mut lasso = LeastSquares::new(Method::Lasso).with_lambda(1e-8).unwrap();
        let beta = lasso.fit(&x, &y).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-3);
        assert!((beta[1] + 2.0).abs() < 1e-3);
    }

    #[test]
    fn lasso_with_large_lambda_is_all_zero() {
        let (x, y) = toy_problem();
        let mut lasso = LeastSquares::new(Method::Lasso).with_lambda(1e3).unwrap();
        let beta = lasso.fit(&x, &y).unwrap();
        assert!(beta.iter().all(|&b| b == 0.0));
        let pred = lasso.predict(&x).unwrap();
        assert!(pred.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn lasso_selects_nearest_neighbour_couplings() {
        let mut rng = StdRng::seed_from_u64(2018);
        let data = generate_regression_data(6, 300, &mut rng).unwrap();
        let mut lasso = LeastSquares::new(Method::Lasso).with_lambda(0.01).unwrap();
        let beta = lasso.fit(&data.x, &data.y).unwrap();

        // Each bond (i, i+1) is split between J[i][i+1] and J[i+1][i].
        let l = 6;
        for i in 0..l {
            let j = (i + 1) % l;
            let bond = beta[i * l + j] + beta[j * l + i];
            assert!((bond + 1.0).abs() < 0.1, "bond {i}-{j} = {bond}");
        }
    }

    #[test]
    fn negative_lambda_is_rejected() {
        let mut ridge = LeastSquares::new(Method::Ridge);
        assert!(ridge.set_lambda(-1.0).is_err());
        assert!(ridge.set_lambda(f64::NAN).is_err());
    }

    #[test]
    fn predict_before_fit_is_an_error() {
        let ols = LeastSquares::new(Method::Ols);
        assert!(ols.predict(&DMatrix::zeros(2, 2)).is_err());
    }
}
