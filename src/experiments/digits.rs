//! Handwritten digit classification on shift-augmented MNIST.
//!
//! A share of the shuffled originals is reserved for validation before the
//! rest is augmented with four one-pixel shifts. The network trains on the
//! augmented set; its accuracy on the reserved originals is reported, and a
//! random selection of misclassified digits is drawn as an image gallery.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::data::digits::{augment_and_split, load_mnist};
use crate::data::{DigitImages, rows_to_matrix};
use crate::domain::{DigitsConfig, MetricRow, Report};
use crate::error::AppError;
use crate::experiments::{ExperimentRun, Panels, build_classifier, fit_options, training_figure};
use crate::math::{to_label, to_onehot};
use crate::plot::GalleryImage;
use crate::report::accuracy;

const GALLERY_COLUMNS: usize = 5;

pub fn run(config: &DigitsConfig) -> Result<ExperimentRun, AppError> {
    let data = load_mnist(&config.mnist_dir, config.samples)?;
    run_on(data, config)
}

/// Train and evaluate on already loaded images.
pub fn run_on(data: DigitImages, config: &DigitsConfig) -> Result<ExperimentRun, AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let side = data.side;
    let split = augment_and_split(data, config.validation_share, &mut rng)?;
    info!(
        train = split.train.len(),
        validation = split.validation.len(),
        "augmented digit split"
    );

    let x_train = rows_to_matrix(&split.train.images)?;
    let y_train = to_onehot(&split.train.labels)?;
    let x_validation = rows_to_matrix(&split.validation.images)?;

    let mut nn = build_classifier(x_train.ncols(), y_train.ncols(), &config.network, config.seed)?;
    let history = nn.fit(&x_train, &y_train, &fit_options(&config.network, config.seed.wrapping_add(1)))?;

    let predicted = to_label(&nn.predict(&x_validation)?);
    let acc = accuracy(&split.validation.labels, &predicted)?;
    info!(accuracy = acc, "validation accuracy");

    let misses: Vec<usize> = (0..predicted.len())
        .filter(|&i| predicted[i] != split.validation.labels[i])
        .collect();
    let gallery: Vec<GalleryImage> = misses
        .choose_multiple(&mut rng, config.gallery_size.min(misses.len()))
        .map(|&i| GalleryImage {
            title: format!("true: {}, guess: {}", split.validation.labels[i], predicted[i]),
            side,
            pixels: split.validation.images[i].clone(),
        })
        .collect();

    let mut report = Report::new("digits")
        .param("samples", split.validation.len() + split.train.len() / 5)
        .param("hidden", format!("{:?}", config.network.hidden))
        .param("epochs", config.network.epochs)
        .param("batch_size", config.network.batch_size)
        .param("optimizer", format!("{:?}", config.network.optimizer).to_lowercase())
        .param("seed", config.seed);
    report.metrics.push(MetricRow::classification("validation", acc));
    report.params.insert("misclassified".to_string(), misses.len().to_string());
    report.figures.push(training_figure(&history));

    let mut run = ExperimentRun::new(report);
    run.panels.push(Panels::Gallery {
        name: "misclassified".to_string(),
        grid_cols: GALLERY_COLUMNS,
        images: gallery,
    });
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NetworkConfig, OptimizerKind};
    use std::path::PathBuf;

    /// 6×6 images of a horizontal (label 0) or vertical (label 1) bar.
    fn bars(n: usize) -> DigitImages {
        let side = 6;
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for k in 0..n {
            let label = k % 2;
            let pos = 1 + (k / 2) % 4;
            let mut img = vec![0.0; side * side];
            for t in 0..side {
                let idx = if label == 0 { pos * side + t } else { t * side + pos };
                img[idx] = 1.0;
            }
            images.push(img);
            labels.push(label);
        }
        DigitImages { side, images, labels }
    }

    fn config() -> DigitsConfig {
        DigitsConfig {
            mnist_dir: PathBuf::from("unused"),
            samples: 200,
            validation_share: 0.2,
            gallery_size: 25,
            seed: 25251,
            network: NetworkConfig {
                hidden: vec![16],
                epochs: 30,
                batch_size: 20,
                learning_rate: 0.01,
                lambda: 0.0,
                validation_fraction: 0.1,
                validation_skip: 10,
                optimizer: OptimizerKind::Adam,
            },
        }
    }

    #[test]
    fn bars_are_classified() {
        let run = run_on(bars(200), &config()).unwrap();
        let acc = run.report.metrics[0].accuracy.unwrap();
        assert!(acc > 0.95, "accuracy = {acc}");

        let Panels::Gallery { images, .. } = &run.panels[0] else {
            panic!("expected a gallery");
        };
        assert!(images.len() <= 25);
        assert_eq!(run.report.params["samples"], "200");
    }

    #[test]
    fn missing_mnist_directory_is_a_data_error() {
        let err = run(&config()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }
}
