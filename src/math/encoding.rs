//! Label encodings for the classifiers.

use nalgebra::DMatrix;

use crate::error::AppError;

/// Encode integer labels as one-hot rows.
///
/// The number of categories is `max(label) + 1`, so labels `[0, 1, 1]` give a
/// `3 × 2` matrix.
pub fn to_onehot(labels: &[usize]) -> Result<DMatrix<f64>, AppError> {
    let Some(&max) = labels.iter().max() else {
        return Err(AppError::data("Cannot one-hot encode an empty label vector."));
    };
    let mut out = DMatrix::zeros(labels.len(), max + 1);
    for (row, &label) in labels.iter().enumerate() {
        out[(row, label)] = 1.0;
    }
    Ok(out)
}

/// Decode class probabilities (one row per sample) into labels via row-wise argmax.
pub fn to_label(probabilities: &DMatrix<f64>) -> Vec<usize> {
    probabilities
        .row_iter()
        .map(|row| {
            let mut best = 0;
            for (j, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onehot_width_is_max_label_plus_one() {
        let m = to_onehot(&[0, 2, 1, 2]).unwrap();
        assert_eq!(m.shape(), (4, 3));
        assert_eq!(m[(1, 2)], 1.0);
        assert_eq!(m.row(1).sum(), 1.0);
    }

    #[test]
    fn label_round_trips_through_onehot() {
        let labels = vec![3, 0, 1, 1, 2];
        assert_eq!(to_label(&to_onehot(&labels).unwrap()), labels);
    }

    #[test]
    fn empty_labels_are_rejected() {
        assert!(to_onehot(&[]).is_err());
    }
}
