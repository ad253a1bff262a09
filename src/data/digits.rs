//! MNIST digits: loading, validation split and shift augmentation.
//!
//! Training data is enlarged five-fold by shifting each training image one
//! pixel down, right, up and left (the vacated edge is zero-filled) and keeping
//! the unshifted original. Validation images are held out *before*
//! augmentation so no shifted copy of a validation digit is seen in training.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use mnist::{Mnist, MnistBuilder};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::error::AppError;

/// Side of an MNIST image in pixels.
pub const IMAGE_SIDE: usize = 28;

/// Number of images in the MNIST training file.
pub const MNIST_TRAIN_LEN: usize = 60_000;

/// Number of images in the MNIST t10k file.
pub const MNIST_TEST_LEN: usize = 10_000;

const IDX_IMAGES_MAGIC: u32 = 2051;
const IDX_LABELS_MAGIC: u32 = 2049;

/// Kind of IDX file, with the header layout that goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdxKind {
    Images,
    Labels,
}

impl IdxKind {
    fn magic(self) -> u32 {
        match self {
            IdxKind::Images => IDX_IMAGES_MAGIC,
            IdxKind::Labels => IDX_LABELS_MAGIC,
        }
    }

    fn header_len(self) -> usize {
        match self {
            IdxKind::Images => 16,
            IdxKind::Labels => 8,
        }
    }

    fn item_len(self) -> usize {
        match self {
            IdxKind::Images => IMAGE_SIDE * IMAGE_SIDE,
            IdxKind::Labels => 1,
        }
    }
}

/// Files that must be present in the MNIST directory, with their item counts.
///
/// `MnistBuilder::finalize` always decodes the t10k pair, so it is required
/// even though only training images are used.
const MNIST_FILES: [(&str, IdxKind, usize); 4] = [
    ("train-images-idx3-ubyte", IdxKind::Images, MNIST_TRAIN_LEN),
    ("train-labels-idx1-ubyte", IdxKind::Labels, MNIST_TRAIN_LEN),
    ("t10k-images-idx3-ubyte", IdxKind::Images, MNIST_TEST_LEN),
    ("t10k-labels-idx1-ubyte", IdxKind::Labels, MNIST_TEST_LEN),
];

/// A set of square grayscale images with pixels in `[0, 1]`.
#[derive(Debug, Clone, Default)]
pub struct DigitImages {
    pub side: usize,
    pub images: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl DigitImages {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn push(&mut self, image: Vec<f64>, label: usize) {
        self.images.push(image);
        self.labels.push(label);
    }
}

/// Augmented training set and untouched validation set.
#[derive(Debug, Clone)]
pub struct DigitSplit {
    pub train: DigitImages,
    pub validation: DigitImages,
}

/// One-pixel translation applied during augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Down,
    Right,
    Up,
    Left,
}

impl Shift {
    pub const ALL: [Shift; 4] = [Shift::Down, Shift::Right, Shift::Up, Shift::Left];

    fn offset(self) -> (isize, isize) {
        match self {
            Shift::Down => (1, 0),
            Shift::Right => (0, 1),
            Shift::Up => (-1, 0),
            Shift::Left => (0, -1),
        }
    }
}

/// Load the first `samples` MNIST training images from `dir`.
pub fn load_mnist(dir: &Path, samples: usize) -> Result<DigitImages, AppError> {
    if samples == 0 || samples > MNIST_TRAIN_LEN {
        return Err(AppError::usage(format!(
            "MNIST sample count must be in 1..={MNIST_TRAIN_LEN} (got {samples})."
        )));
    }
    for (name, kind, count) in MNIST_FILES {
        check_idx_file(&dir.join(name), kind, count)?;
    }

    // Headers and lengths are checked above; the mnist crate panics on bad files.
    let base_path = format!("{}/", dir.display());
    let Mnist { trn_img, trn_lbl, .. } = MnistBuilder::new()
        .label_format_digit()
        .base_path(&base_path)
        .training_set_length(samples as u32)
        .validation_set_length(0)
        .test_set_length(0)
        .finalize();

    let pixels = IMAGE_SIDE * IMAGE_SIDE;
    let images = trn_img
        .chunks_exact(pixels)
        .take(samples)
        .map(|img| img.iter().map(|&p| f64::from(p) / 255.0).collect())
        .collect();
    let labels = trn_lbl.iter().take(samples).map(|&l| usize::from(l)).collect();

    info!(samples, dir = %dir.display(), "loaded MNIST digits");
    Ok(DigitImages {
        side: IMAGE_SIDE,
        images,
        labels,
    })
}

/// Validate an IDX header and the file length against the expected item count.
fn check_idx_file(path: &Path, kind: IdxKind, count: usize) -> Result<(), AppError> {
    let mut file = File::open(path).map_err(|_| {
        AppError::data(format!(
            "Missing MNIST file '{}' (download the IDX files and unpack them into '{}').",
            path.display(),
            path.parent().unwrap_or(path).display()
        ))
    })?;

    let invalid =
        |what: String| AppError::data(format!("Invalid MNIST file '{}': {what}.", path.display()));

    let mut header = vec![0u8; kind.header_len()];
    file.read_exact(&mut header)
        .map_err(|_| invalid("header is truncated".to_string()))?;
    let fields: Vec<u32> = header
        .chunks_exact(4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if fields[0] != kind.magic() {
        return Err(invalid(format!(
            "magic number {} (expected {})",
            fields[0],
            kind.magic()
        )));
    }
    if fields[1] as usize != count {
        return Err(invalid(format!("{} items (expected {count})", fields[1])));
    }
    if kind == IdxKind::Images
        && (fields[2] as usize != IMAGE_SIDE || fields[3] as usize != IMAGE_SIDE)
    {
        return Err(invalid(format!(
            "{}x{} images (expected {IMAGE_SIDE}x{IMAGE_SIDE})",
            fields[2], fields[3]
        )));
    }

    let expected = (kind.header_len() + count * kind.item_len()) as u64;
    let actual = file
        .metadata()
        .map_err(|e| AppError::data(format!("Failed to stat '{}': {e}", path.display())))?
        .len();
    if actual != expected {
        return Err(invalid(format!("{actual} bytes (expected {expected})")));
    }
    Ok(())
}

/// Translate a square image by one pixel, zero-filling the vacated edge.
pub fn shift_image(pixels: &[f64], side: usize, shift: Shift) -> Vec<f64> {
    let (dr, dc) = shift.offset();
    let mut out = vec![0.0; side * side];
    for row in 0..side {
        for col in 0..side {
            let src_row = row as isize - dr;
            let src_col = col as isize - dc;
            if (0..side as isize).contains(&src_row) && (0..side as isize).contains(&src_col) {
                out[row * side + col] = pixels[src_row as usize * side + src_col as usize];
            }
        }
    }
    out
}

/// Shuffle, reserve `validation_share` of the originals and augment the rest.
pub fn augment_and_split<R: Rng>(
    data: DigitImages,
    validation_share: f64,
    rng: &mut R,
) -> Result<DigitSplit, AppError> {
    if !(validation_share.is_finite() && validation_share > 0.0 && validation_share < 1.0) {
        return Err(AppError::usage(format!(
            "Validation share must be in (0, 1) (got {validation_share})."
        )));
    }
    let side = data.side;
    let n = data.len();
    let n_validation = (validation_share * n as f64) as usize;
    if n_validation == 0 || n_validation == n {
        return Err(AppError::usage(format!(
            "Validation share {validation_share} of {n} images leaves an empty split."
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut validation = DigitImages {
        side,
        ..DigitImages::default()
    };
    let mut originals = DigitImages {
        side,
        ..DigitImages::default()
    };
    for (k, &idx) in order.iter().enumerate() {
        let target = if k < n_validation { &mut validation } else { &mut originals };
        target.push(data.images[idx].clone(), data.labels[idx]);
    }

    let mut train = DigitImages {
        side,
        ..DigitImages::default()
    };
    for shift in Shift::ALL {
        for (img, &label) in originals.images.iter().zip(&originals.labels) {
            train.push(shift_image(img, side, shift), label);
        }
    }
    for (img, label) in originals.images.into_iter().zip(originals.labels) {
        train.push(img, label);
    }

    ensure_not_blank("training", &train)?;
    ensure_not_blank("validation", &validation)?;

    Ok(DigitSplit { train, validation })
}

fn ensure_not_blank(name: &str, set: &DigitImages) -> Result<(), AppError> {
    if let Some(idx) = set.images.iter().position(|img| img.iter().sum::<f64>() == 0.0) {
        return Err(AppError::data(format!("Blank image at index {idx} of the {name} set.")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("mlx-mnist-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn idx_header(fields: &[u32]) -> Vec<u8> {
        fields.iter().flat_map(|f| f.to_be_bytes()).collect()
    }

    #[test]
    fn garbage_idx_files_are_a_data_error() {
        let dir = scratch_dir("garbage");
        for (name, _, _) in MNIST_FILES {
            std::fs::write(dir.join(name), b"garbage").unwrap();
        }

        let err = load_mnist(&dir, 100).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
        assert!(err.message().contains("Invalid MNIST file"), "{}", err.message());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn idx_header_checks_magic_count_and_length() {
        let dir = scratch_dir("header");
        let path = dir.join("labels");

        std::fs::write(&path, idx_header(&[IDX_IMAGES_MAGIC, 3])).unwrap();
        assert!(check_idx_file(&path, IdxKind::Labels, 3).is_err());

        let mut truncated = idx_header(&[IDX_LABELS_MAGIC, 3]);
        truncated.extend([1, 2]);
        std::fs::write(&path, &truncated).unwrap();
        let err = check_idx_file(&path, IdxKind::Labels, 3).unwrap_err();
        assert!(err.message().contains("10 bytes (expected 11)"), "{}", err.message());

        truncated.push(3);
        std::fs::write(&path, &truncated).unwrap();
        assert!(check_idx_file(&path, IdxKind::Labels, 3).is_ok());
        assert!(check_idx_file(&path, IdxKind::Labels, 4).is_err());

        let images = dir.join("images");
        let mut body = idx_header(&[IDX_IMAGES_MAGIC, 1, 27, 28]);
        body.extend(vec![0u8; 27 * 28]);
        std::fs::write(&images, &body).unwrap();
        assert!(check_idx_file(&images, IdxKind::Images, 1).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    fn ramp(side: usize) -> Vec<f64> {
        (0..side * side).map(|i| (i + 1) as f64).collect()
    }

    #[test]
    fn shift_down_zeroes_top_row() {
        let img = ramp(3);
        let out = shift_image(&img, 3, Shift::Down);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn shift_left_zeroes_last_column() {
        let img = ramp(3);
        let out = shift_image(&img, 3, Shift::Left);
        assert_eq!(out, vec![2.0, 3.0, 0.0, 5.0, 6.0, 0.0, 8.0, 9.0, 0.0]);
    }

    #[test]
    fn shift_right_and_up() {
        let img = ramp(2);
        assert_eq!(shift_image(&img, 2, Shift::Right), vec![0.0, 1.0, 0.0, 3.0]);
        assert_eq!(shift_image(&img, 2, Shift::Up), vec![3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn augmentation_is_five_fold_on_training_originals() {
        let data = DigitImages {
            side: 3,
            images: (0..10).map(|_| vec![0.5; 9]).collect(),
            labels: (0..10).collect(),
        };
        let mut rng = StdRng::seed_from_u64(25251);
        let split = augment_and_split(data, 0.2, &mut rng).unwrap();

        assert_eq!(split.validation.len(), 2);
        assert_eq!(split.train.len(), 5 * 8);
        for label in &split.validation.labels {
            assert!(!split.train.labels.contains(label));
        }
    }

    #[test]
    fn blank_images_are_rejected() {
        let mut images: Vec<Vec<f64>> = (0..5).map(|_| vec![1.0; 4]).collect();
        images[3] = vec![0.0; 4];
        let data = DigitImages {
            side: 2,
            images,
            labels: vec![0; 5],
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(augment_and_split(data, 0.2, &mut rng).is_err());
    }

    #[test]
    fn missing_files_are_a_data_error() {
        let dir = std::env::temp_dir().join("mlx-no-mnist-here");
        let err = load_mnist(&dir, 100).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }
}
