//! Regression data from the 1D Ising model.
//!
//! Each sample is a random chain `s ∈ {−1, +1}^L` with periodic boundaries and
//! nearest-neighbour coupling `J = 1`:
//!
//! ```text
//! E(s) = −J Σ_i s_i s_{(i+1) mod L}
//! ```
//!
//! The regression does not assume the nearest-neighbour structure. Instead the
//! design row holds every pairwise product `s_i s_j` (flattened row-major), so a
//! fitted coefficient vector reshapes into an `L × L` coupling matrix.

use nalgebra::{DMatrix, DVector};
use rand::Rng;

use crate::error::AppError;

/// Coupling constant of the simulated chains.
pub const COUPLING: f64 = 1.0;

/// Design matrix and energies for a batch of chains.
#[derive(Debug, Clone)]
pub struct RegressionData {
    /// Chain length; the design matrix has `l²` columns.
    pub l: usize,
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
}

/// Draw `n` chains of length `l` with spins uniform on `{−1, +1}`.
pub fn generate_chain_states<R: Rng>(l: usize, n: usize, rng: &mut R) -> Vec<Vec<i8>> {
    (0..n)
        .map(|_| {
            (0..l)
                .map(|_| if rng.gen_bool(0.5) { 1 } else { -1 })
                .collect()
        })
        .collect()
}

/// Periodic nearest-neighbour energy of one chain.
pub fn chain_energy(state: &[i8]) -> f64 {
    let l = state.len();
    let sum: i32 = (0..l)
        .map(|i| i32::from(state[i]) * i32::from(state[(i + 1) % l]))
        .sum();
    -COUPLING * f64::from(sum)
}

/// Build the pairwise design matrix and the energy targets.
pub fn design_matrix_1d(states: &[Vec<i8>]) -> Result<RegressionData, AppError> {
    let Some(first) = states.first() else {
        return Err(AppError::usage("Need at least one chain to build a design matrix."));
    };
    let l = first.len();
    if l == 0 || states.iter().any(|s| s.len() != l) {
        return Err(AppError::data("All chains must share the same non-zero length."));
    }

    let x = DMatrix::from_fn(states.len(), l * l, |r, c| {
        f64::from(states[r][c / l] * states[r][c % l])
    });
    let y = DVector::from_iterator(states.len(), states.iter().map(|s| chain_energy(s)));

    Ok(RegressionData { l, x, y })
}

/// Generate `n` random chains of length `l` and their regression data.
pub fn generate_regression_data<R: Rng>(
    l: usize,
    n: usize,
    rng: &mut R,
) -> Result<RegressionData, AppError> {
    if l < 2 {
        return Err(AppError::usage(format!("Chain length must be >= 2 (got {l}).")));
    }
    if n == 0 {
        return Err(AppError::usage("Number of chains must be > 0."));
    }
    let states = generate_chain_states(l, n, rng);
    design_matrix_1d(&states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn aligned_chain_has_minimum_energy() {
        assert_eq!(chain_energy(&[1, 1, 1, 1]), -4.0);
        assert_eq!(chain_energy(&[1, -1, 1, -1]), 4.0);
        // Periodic boundary: the last spin couples back to the first.
        assert_eq!(chain_energy(&[1, 1, -1]), 1.0);
    }

    #[test]
    fn design_matrix_shape_and_entries() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = generate_regression_data(5, 12, &mut rng).unwrap();
        assert_eq!(data.x.shape(), (12, 25));
        assert_eq!(data.y.len(), 12);
        // Diagonal products s_i s_i are always +1.
        for r in 0..12 {
            for i in 0..5 {
                assert_eq!(data.x[(r, i * 5 + i)], 1.0);
            }
        }
    }

    #[test]
    fn true_couplings_reproduce_energies() {
        let mut rng = StdRng::seed_from_u64(11);
        let l = 6;
        let data = generate_regression_data(l, 20, &mut rng).unwrap();

        let mut j = DVector::zeros(l * l);
        for i in 0..l {
            j[i * l + (i + 1) % l] = -COUPLING;
        }
        let predicted = &data.x * j;
        assert!((predicted - &data.y).norm() < 1e-12);
    }

    #[test]
    fn ragged_chains_are_rejected() {
        let states = vec![vec![1, -1, 1], vec![1, 1]];
        assert!(design_matrix_1d(&states).is_err());
    }
}
