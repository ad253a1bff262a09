//! Parameter grids for the hyperparameter sweeps.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `10^start` and `10^stop`
/// (inclusive), the way `numpy.logspace` does.
pub fn log_space(start: f64, stop: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    Ok(lin_space(start, stop, steps)?
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect())
}

/// Generate `steps` evenly spaced points between `start` and `stop` (inclusive).
pub fn lin_space(start: f64, stop: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(start.is_finite() && stop.is_finite()) {
        return Err(AppError::usage(format!(
            "Invalid grid range: start={start}, stop={stop} (must be finite)."
        )));
    }
    match steps {
        0 => Err(AppError::usage("Grid steps must be >= 1.")),
        1 => Ok(vec![start]),
        _ => {
            let step = (stop - start) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| start + step * i as f64).collect();
            // Pin the last point so it matches `stop` exactly.
            out[steps - 1] = stop;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(-3.0, 5.0, 10).unwrap();
        assert_eq!(v.len(), 10);
        assert!((v[0] - 1e-3).abs() < 1e-15);
        assert!((v[9] - 1e5).abs() < 1e-6);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn lin_space_matches_training_fractions() {
        let v = lin_space(0.02, 0.5, 25).unwrap();
        assert!((v[0] - 0.02).abs() < 1e-15);
        assert!((v[1] - 0.04).abs() < 1e-12);
        assert_eq!(v[24], 0.5);
    }

    #[test]
    fn zero_steps_is_rejected() {
        assert!(lin_space(0.0, 1.0, 0).is_err());
        assert_eq!(lin_space(0.3, 1.0, 1).unwrap(), vec![0.3]);
    }
}
