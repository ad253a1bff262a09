//! Shared domain types.
//!
//! Report types are serializable so a finished run can be:
//!
//! - printed as terminal tables
//! - exported to JSON
//! - reloaded later for the terminal viewer (`mlx show`)

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Axis scaling for figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    /// Map a data value into plotting space (`log10` for log axes).
    ///
    /// Non-positive values on a log axis map to `None` and are skipped by renderers.
    pub fn project(self, v: f64) -> Option<f64> {
        match self {
            Scale::Linear => v.is_finite().then_some(v),
            Scale::Log => (v.is_finite() && v > 0.0).then(|| v.log10()),
        }
    }

    /// Format a tick label given a value in plotting space.
    pub fn tick_label(self, projected: f64) -> String {
        match self {
            Scale::Linear => format!("{projected:.3}"),
            Scale::Log => log_tick(projected),
        }
    }
}

/// Label for a log10-projected tick: `1e-3` on whole powers, the plain value between them.
pub fn log_tick(projected: f64) -> String {
    let power = projected.round();
    if (projected - power).abs() < 1e-9 {
        return format!("1e{}", power as i64);
    }
    let value = 10f64.powf(projected);
    if value >= 1e4 || value < 1e-2 {
        format!("{value:.1e}")
    } else {
        format!("{value:.2}")
    }
}

/// Gradient-descent flavour used when training the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// Plain mini-batch stochastic gradient descent.
    Sgd,
    /// Adam with the usual `β1 = 0.9`, `β2 = 0.999`, `ε = 1e-8`.
    Adam,
}

/// A named line series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

/// A line chart with one or more series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// File stem used when the figure is written to disk.
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub series: Vec<Series>,
}

/// One row of an experiment's result table.
///
/// Regression sweeps fill `mse`/`r2`; classifiers fill `accuracy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Model or evaluation set the row belongs to (e.g. `ridge`, `critical`).
    pub label: String,
    /// Swept parameter value (λ, training size), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl MetricRow {
    pub fn regression(label: impl Into<String>, param: Option<f64>, mse: f64, r2: f64) -> Self {
        Self {
            label: label.into(),
            param,
            mse: Some(mse),
            r2: Some(r2),
            accuracy: None,
        }
    }

    pub fn classification(label: impl Into<String>, accuracy: f64) -> Self {
        Self {
            label: label.into(),
            param: None,
            mse: None,
            r2: None,
            accuracy: Some(accuracy),
        }
    }
}

/// A finished experiment run (JSON export schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub tool: String,
    pub experiment: String,
    pub created: DateTime<Local>,
    /// Effective parameters, stringified for display.
    pub params: BTreeMap<String, String>,
    pub metrics: Vec<MetricRow>,
    pub figures: Vec<Figure>,
}

impl Report {
    pub fn new(experiment: impl Into<String>) -> Self {
        Self {
            tool: "mlx".to_string(),
            experiment: experiment.into(),
            created: Local::now(),
            params: BTreeMap::new(),
            metrics: Vec::new(),
            figures: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }
}

/// Where and how an experiment presents its results.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Directory for SVG figures; `None` disables figure files.
    pub out_dir: Option<PathBuf>,
    /// Optional JSON report path.
    pub export: Option<PathBuf>,
    /// Print ASCII plots to the terminal.
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Open the interactive viewer after the run.
    pub show: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: None,
            export: None,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            show: false,
        }
    }
}

/// Ridge/Lasso/OLS test error as a function of the shrinkage parameter λ.
#[derive(Debug, Clone)]
pub struct LambdaSweepConfig {
    /// Spins per chain.
    pub l: usize,
    /// Total number of chains (train + test).
    pub n: usize,
    /// Training fraction; the first `⌊train·n⌋` chains train, the rest test.
    pub train: f64,
    /// λ grid is `logspace(lambda_min_exp, lambda_max_exp, lambda_steps)`.
    pub lambda_min_exp: f64,
    pub lambda_max_exp: f64,
    pub lambda_steps: usize,
    pub seed: u64,
}

impl Default for LambdaSweepConfig {
    fn default() -> Self {
        Self {
            l: 40,
            n: 1000,
            train: 0.4,
            lambda_min_exp: -3.0,
            lambda_max_exp: 5.0,
            lambda_steps: 10,
            seed: 2018,
        }
    }
}

/// OLS test error as a function of the training set size.
#[derive(Debug, Clone)]
pub struct TrainSizeConfig {
    pub l: usize,
    pub n: usize,
    /// Number of training fractions in `linspace(train_min, train_max, m)`.
    pub m: usize,
    pub train_min: f64,
    pub train_max: f64,
    pub seed: u64,
}

impl Default for TrainSizeConfig {
    fn default() -> Self {
        Self {
            l: 40,
            n: 2000,
            m: 10,
            train_min: 0.02,
            train_max: 0.5,
            seed: 2019,
        }
    }
}

/// Hidden layers and training schedule for the feed-forward classifier.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Sigmoid hidden layer widths; a softmax output layer is always appended.
    pub hidden: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// L2 regularization strength.
    pub lambda: f64,
    pub validation_fraction: f64,
    /// Log validation metrics every `validation_skip` epochs.
    pub validation_skip: usize,
    pub optimizer: OptimizerKind,
}

/// Metropolis sampling of the 2D Ising model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Lattice side; each configuration has `l²` spins.
    pub l: usize,
    pub samples_per_temperature: usize,
    pub thermalization_sweeps: usize,
    /// Sweeps between two recorded configurations.
    pub decorrelation_sweeps: usize,
    pub seed: u64,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            l: 40,
            samples_per_temperature: 1600,
            thermalization_sweeps: 500,
            decorrelation_sweeps: 10,
            seed: 2018,
        }
    }
}

/// Digit classification with shift-augmented MNIST.
#[derive(Debug, Clone)]
pub struct DigitsConfig {
    pub mnist_dir: PathBuf,
    /// Number of original MNIST training images to use.
    pub samples: usize,
    /// Share of the (shuffled) originals reserved for validation.
    pub validation_share: f64,
    /// Maximum number of misclassified digits in the gallery.
    pub gallery_size: usize,
    pub seed: u64,
    pub network: NetworkConfig,
}

impl Default for DigitsConfig {
    fn default() -> Self {
        Self {
            mnist_dir: PathBuf::from("data/mnist"),
            samples: 10_000,
            validation_share: 0.2,
            gallery_size: 25,
            seed: 25251,
            network: NetworkConfig {
                hidden: vec![100, 50],
                // MNIST is much larger than the 8x8 digit set; `--epochs` raises it.
                epochs: 20,
                batch_size: 200,
                learning_rate: 1e-3,
                lambda: 0.0,
                validation_fraction: 0.2,
                validation_skip: 50,
                optimizer: OptimizerKind::Adam,
            },
        }
    }
}

/// Ordered/disordered phase classification of 2D Ising configurations.
#[derive(Debug, Clone)]
pub struct IsingClassifyConfig {
    /// Number of training (and test) configurations kept in the cache.
    pub n_samples: usize,
    pub cache_dir: PathBuf,
    pub lattice: LatticeConfig,
    pub seed: u64,
    pub network: NetworkConfig,
}

impl Default for IsingClassifyConfig {
    fn default() -> Self {
        Self {
            n_samples: 10_000,
            cache_dir: PathBuf::from("cache"),
            lattice: LatticeConfig::default(),
            seed: 2019,
            network: NetworkConfig {
                hidden: vec![100],
                epochs: 20,
                batch_size: 500,
                learning_rate: 1e-3,
                lambda: 0.0,
                validation_fraction: 0.2,
                validation_skip: 50,
                optimizer: OptimizerKind::Adam,
            },
        }
    }
}
