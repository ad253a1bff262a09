//! Ordered/disordered phase classification of 2D Ising configurations.
//!
//! Trains on the cached train split, reports accuracy on the test split and on
//! the critical band (`2.0 ≤ T ≤ 2.5`), which the network never saw.

use nalgebra::DMatrix;
use tracing::info;

use crate::data::{IsingSamples, load_ising_smaller, rows_to_matrix};
use crate::domain::{IsingClassifyConfig, MetricRow, Report};
use crate::error::AppError;
use crate::experiments::{ExperimentRun, build_classifier, fit_options, training_figure};
use crate::math::{to_label, to_onehot};
use crate::models::NeuralNetwork;
use crate::report::accuracy;

pub fn run(config: &IsingClassifyConfig) -> Result<ExperimentRun, AppError> {
    let samples = load_ising_smaller(&config.cache_dir, config.n_samples, &config.lattice)?;
    run_on(&samples, config)
}

/// Train and evaluate on an already loaded sample split.
pub fn run_on(samples: &IsingSamples, config: &IsingClassifyConfig) -> Result<ExperimentRun, AppError> {
    samples.validate()?;
    let x_train = rows_to_matrix(&samples.x_train)?;
    let labels_train = to_usize(&samples.target_train);
    let y_train = to_onehot(&labels_train)?;

    info!(
        train = samples.x_train.len(),
        test = samples.x_test.len(),
        critical = samples.x_critical.len(),
        "classifying Ising phases"
    );

    let mut nn = build_classifier(x_train.ncols(), y_train.ncols(), &config.network, config.seed)?;
    let history = nn.fit(&x_train, &y_train, &fit_options(&config.network, config.seed.wrapping_add(1)))?;

    let test_accuracy = score(&nn, &rows_to_matrix(&samples.x_test)?, &samples.target_test)?;
    info!(accuracy = test_accuracy, "test accuracy");

    let mut report = Report::new("ising-classify")
        .param("l", samples.lattice.l)
        .param("n_samples", samples.x_train.len())
        .param("hidden", format!("{:?}", config.network.hidden))
        .param("epochs", config.network.epochs)
        .param("batch_size", config.network.batch_size)
        .param("seed", config.seed);
    report.metrics.push(MetricRow::classification("test", test_accuracy));

    if !samples.x_critical.is_empty() {
        let critical_accuracy = score(&nn, &rows_to_matrix(&samples.x_critical)?, &samples.target_critical)?;
        info!(accuracy = critical_accuracy, "critical accuracy");
        report.metrics.push(MetricRow::classification("critical", critical_accuracy));
    }

    report.figures.push(training_figure(&history));
    Ok(ExperimentRun::new(report))
}

fn to_usize(labels: &[u8]) -> Vec<usize> {
    labels.iter().map(|&l| usize::from(l)).collect()
}

fn score(nn: &NeuralNetwork, x: &DMatrix<f64>, targets: &[u8]) -> Result<f64, AppError> {
    let predicted = to_label(&nn.predict(x)?);
    accuracy(&to_usize(targets), &predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LatticeConfig, NetworkConfig, OptimizerKind};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::path::PathBuf;

    /// Mostly aligned spins (label 1) vs uniformly random spins (label 0).
    fn synthetic(n: usize, l: usize, rng: &mut StdRng) -> (Vec<Vec<i8>>, Vec<u8>) {
        (0..n)
            .map(|k| {
                let ordered = k % 2 == 0;
                let sign: i8 = if rng.gen_bool(0.5) { 1 } else { -1 };
                let spins = (0..l * l)
                    .map(|_| {
                        if ordered {
                            if rng.gen_bool(0.95) { sign } else { -sign }
                        } else if rng.gen_bool(0.5) {
                            1
                        } else {
                            -1
                        }
                    })
                    .collect();
                (spins, u8::from(ordered))
            })
            .unzip()
    }

    fn config() -> IsingClassifyConfig {
        IsingClassifyConfig {
            n_samples: 400,
            cache_dir: PathBuf::from("unused"),
            lattice: LatticeConfig::default(),
            seed: 2019,
            network: NetworkConfig {
                hidden: vec![20],
                epochs: 100,
                batch_size: 50,
                learning_rate: 0.01,
                lambda: 0.0,
                validation_fraction: 0.2,
                validation_skip: 10,
                optimizer: OptimizerKind::Adam,
            },
        }
    }

    #[test]
    fn separates_ordered_from_random_configurations() {
        let mut rng = StdRng::seed_from_u64(7);
        let (x_train, target_train) = synthetic(400, 6, &mut rng);
        let (x_test, target_test) = synthetic(200, 6, &mut rng);
        let (x_critical, target_critical) = synthetic(50, 6, &mut rng);
        let samples = IsingSamples {
            lattice: LatticeConfig {
                l: 6,
                ..LatticeConfig::default()
            },
            x_train,
            target_train,
            x_test,
            target_test,
            x_critical,
            target_critical,
        };

        let run = run_on(&samples, &config()).unwrap();
        let metrics = &run.report.metrics;
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].label, "test");
        assert!(metrics[0].accuracy.unwrap() > 0.9, "{:?}", metrics[0]);
        assert_eq!(metrics[1].label, "critical");
        assert_eq!(run.report.figures[0].series[0].points.len(), 100);
    }
}
