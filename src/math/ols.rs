//! SVD-based least squares solvers.
//!
//! The Ising design matrices are wide (L² = 1600 columns for L = 40) and the
//! training sets in the sweeps are often smaller than that, so the normal
//! equations are singular. Both solvers work from the thin SVD `X = U Σ Vᵀ`:
//!
//! ```text
//! OLS:   β = V Σ⁺ Uᵀ y            (minimum-norm solution)
//! Ridge: β = V diag(s / (s² + λ)) Uᵀ y
//! ```

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Singular values below `tol` are treated as zero, which yields the
    // pseudo-inverse solution when `X` is rank deficient.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the ridge problem `min ‖y − Xβ‖² + λ‖β‖²` through the SVD of `X`.
///
/// Returns `None` when the decomposition fails or produces non-finite values.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    let u = svd.u.as_ref()?;
    let v_t = svd.v_t.as_ref()?;

    let uty = u.tr_mul(y);
    let scaled = DVector::from_iterator(
        uty.len(),
        uty.iter().zip(svd.singular_values.iter()).map(|(&c, &s)| {
            let denom = s * s + lambda;
            if denom > 0.0 { c * s / denom } else { 0.0 }
        }),
    );

    let beta = v_t.tr_mul(&scaled);
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_underdetermined_is_minimum_norm() {
        // One equation, two unknowns: b0 + b1 = 2 has minimum-norm solution (1, 1).
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[2.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-10);
        assert!((beta[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn ridge_approaches_ols_for_small_lambda() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[1.0, 3.1, 4.9, 7.2]);

        let ols = solve_least_squares(&x, &y).unwrap();
        let ridge = solve_ridge(&x, &y, 1e-12).unwrap();
        assert!((ols - ridge).norm() < 1e-8);
    }

    #[test]
    fn ridge_shrinks_coefficients() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.5, 0.2, 1.0, 0.7, 0.3]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 0.5]);

        let small = solve_ridge(&x, &y, 0.01).unwrap();
        let large = solve_ridge(&x, &y, 100.0).unwrap();
        assert!(large.norm() < small.norm());
    }
}
