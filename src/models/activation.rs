//! Activation and cost functions for the feed-forward network.
//!
//! Activations act column-wise on `(neurons × batch)` matrices so softmax can
//! normalize each sample independently.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    Identity,
    /// Column-wise softmax; only valid on the output layer.
    Softmax,
}

impl Activation {
    /// Apply the activation to pre-activations `z`.
    pub fn apply(self, z: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Activation::Sigmoid => z.map(sigmoid),
            Activation::Tanh => z.map(f64::tanh),
            Activation::Relu => z.map(|v| v.max(0.0)),
            Activation::Identity => z.clone(),
            Activation::Softmax => {
                let mut out = z.clone();
                for mut col in out.column_iter_mut() {
                    let max = col.max();
                    col.apply(|v| *v = (*v - max).exp());
                    let sum = col.sum();
                    col /= sum;
                }
                out
            }
        }
    }

    /// Element-wise derivative `f'(z)`, given both `z` and `a = f(z)`.
    ///
    /// Softmax has no element-wise derivative; it is only used together with
    /// the cross-entropy cost, whose output delta already folds it in.
    pub fn derivative(self, z: &DMatrix<f64>, a: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Activation::Sigmoid => a.map(|v| v * (1.0 - v)),
            Activation::Tanh => a.map(|v| 1.0 - v * v),
            Activation::Relu => z.map(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Identity | Activation::Softmax => DMatrix::from_element(z.nrows(), z.ncols(), 1.0),
        }
    }
}

/// Training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cost {
    /// `−Σ y ln a` (softmax) / binary cross-entropy (sigmoid).
    CrossEntropy,
    /// `½ Σ (a − y)²`.
    Quadratic,
}

/// Guards `ln(0)` in the cross-entropy.
const LOG_EPS: f64 = 1e-12;

impl Cost {
    /// Mean cost per sample of outputs `a` against targets `y` (both `outputs × batch`).
    pub fn value(self, output: Activation, a: &DMatrix<f64>, y: &DMatrix<f64>) -> f64 {
        let m = a.ncols().max(1) as f64;
        let total: f64 = match (self, output) {
            (Cost::CrossEntropy, Activation::Softmax) => a
                .iter()
                .zip(y.iter())
                .map(|(&a, &y)| -y * (a.max(LOG_EPS)).ln())
                .sum(),
            (Cost::CrossEntropy, _) => a
                .iter()
                .zip(y.iter())
                .map(|(&a, &y)| {
                    let a = a.clamp(LOG_EPS, 1.0 - LOG_EPS);
                    -y * a.ln() - (1.0 - y) * (1.0 - a).ln()
                })
                .sum(),
            (Cost::Quadratic, _) => 0.5 * (a - y).norm_squared(),
        };
        total / m
    }

    /// Output-layer error `∂C/∂z` for a batch.
    pub fn delta(
        self,
        output: Activation,
        z: &DMatrix<f64>,
        a: &DMatrix<f64>,
        y: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        match self {
            Cost::CrossEntropy => a - y,
            Cost::Quadratic => (a - y).component_mul(&output.derivative(z, a)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_columns_sum_to_one() {
        let z = DMatrix::from_row_slice(3, 2, &[1.0, 1000.0, 2.0, 1000.0, 3.0, -5.0]);
        let a = Activation::Softmax.apply(&z);
        for col in a.column_iter() {
            assert!((col.sum() - 1.0).abs() < 1e-12);
            assert!(col.iter().all(|v| v.is_finite()));
        }
        assert!(a[(2, 0)] > a[(1, 0)] && a[(1, 0)] > a[(0, 0)]);
    }

    #[test]
    fn sigmoid_derivative_peaks_at_zero() {
        let z = DMatrix::from_row_slice(1, 3, &[-2.0, 0.0, 2.0]);
        let a = Activation::Sigmoid.apply(&z);
        let d = Activation::Sigmoid.derivative(&z, &a);
        assert!((d[(0, 1)] - 0.25).abs() < 1e-12);
        assert!(d[(0, 0)] < 0.25 && d[(0, 2)] < 0.25);
    }

    #[test]
    fn cross_entropy_is_zero_for_perfect_softmax_output() {
        let a = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
        let y = a.clone();
        assert!(Cost::CrossEntropy.value(Activation::Softmax, &a, &y).abs() < 1e-12);
    }

    #[test]
    fn cross_entropy_delta_is_output_error() {
        let z = DMatrix::zeros(2, 1);
        let a = DMatrix::from_row_slice(2, 1, &[0.7, 0.3]);
        let y = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
        let d = Cost::CrossEntropy.delta(Activation::Softmax, &z, &a, &y);
        assert!((d[(0, 0)] + 0.3).abs() < 1e-12);
        assert!((d[(1, 0)] - 0.3).abs() < 1e-12);
    }
}
