//! Command-line parsing for the experiment runner.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! experiment pipelines. Defaults mirror the `*Config::default()` values in
//! `domain`, so running a subcommand without flags reproduces the standard
//! setup of each experiment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::OptimizerKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mlx",
    version,
    about = "Regression and neural-network experiments on Ising-model and MNIST data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Test MSE and R² of OLS, Ridge and Lasso as a function of λ (1D Ising chains).
    Lambda(LambdaArgs),
    /// OLS test error and fitted coupling matrices as a function of the training set size.
    TrainSize(TrainSizeArgs),
    /// Classify shift-augmented MNIST digits with a feed-forward network.
    Digits(DigitsArgs),
    /// Classify ordered vs disordered 2D Ising configurations.
    IsingClassify(IsingClassifyArgs),
    /// Regenerate the 2D Ising sample cache.
    IsingCache(IsingCacheArgs),
    /// Open a previously exported report in the terminal viewer.
    Show(ShowArgs),
}

/// Presentation options shared by every experiment.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Write SVG figures (timestamped) into this directory.
    #[arg(long, env = "MLX_OUT_DIR", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Export the report (params, metrics, figures) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Open the interactive viewer after the run.
    #[arg(long)]
    pub show: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct LambdaArgs {
    /// Spins per chain.
    #[arg(short = 'L', long = "side", default_value_t = 40)]
    pub l: usize,

    /// Number of chains (train + test).
    #[arg(short = 'N', long = "samples", default_value_t = 1000)]
    pub n: usize,

    /// Training fraction (the first ⌊train·N⌋ chains).
    #[arg(long, default_value_t = 0.4)]
    pub train: f64,

    /// Smallest λ exponent (λ = 10^exp).
    #[arg(long, default_value_t = -3.0, allow_hyphen_values = true)]
    pub lambda_min_exp: f64,

    /// Largest λ exponent.
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
    pub lambda_max_exp: f64,

    /// Number of λ values.
    #[arg(long, default_value_t = 10)]
    pub lambda_steps: usize,

    #[arg(long, default_value_t = 2018)]
    pub seed: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct TrainSizeArgs {
    /// Spins per chain.
    #[arg(short = 'L', long = "side", default_value_t = 40)]
    pub l: usize,

    /// Number of chains generated for every training fraction.
    #[arg(short = 'N', long = "samples", default_value_t = 2000)]
    pub n: usize,

    /// Number of training fractions.
    #[arg(short = 'M', long = "steps", default_value_t = 10)]
    pub m: usize,

    #[arg(long, default_value_t = 0.02)]
    pub train_min: f64,

    #[arg(long, default_value_t = 0.5)]
    pub train_max: f64,

    #[arg(long, default_value_t = 2019)]
    pub seed: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Network hyperparameters; unset flags keep the experiment's defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct NetworkArgs {
    /// Hidden layer widths, e.g. `100,50`.
    #[arg(long, value_delimiter = ',')]
    pub hidden: Option<Vec<usize>>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// L2 regularization strength.
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Share of the training rows held out for validation during training.
    #[arg(long)]
    pub validation_fraction: Option<f64>,

    /// Log validation metrics every N epochs.
    #[arg(long)]
    pub validation_skip: Option<usize>,

    #[arg(long, value_enum)]
    pub optimizer: Option<OptimizerKind>,
}

#[derive(Debug, Args, Clone)]
pub struct DigitsArgs {
    /// Directory with the four MNIST IDX files.
    #[arg(long, env = "MNIST_DIR", default_value = "data/mnist", value_name = "DIR")]
    pub mnist_dir: PathBuf,

    /// Number of original MNIST training images to use.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub samples: usize,

    /// Share of the originals reserved for validation.
    #[arg(long, default_value_t = 0.2)]
    pub validation_share: f64,

    /// Maximum number of misclassified digits drawn.
    #[arg(long, default_value_t = 25)]
    pub gallery_size: usize,

    #[arg(long, default_value_t = 25251)]
    pub seed: u64,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// 2D Ising Monte Carlo settings.
#[derive(Debug, Args, Clone)]
pub struct LatticeArgs {
    /// Lattice side.
    #[arg(short = 'L', long = "side", default_value_t = 40)]
    pub l: usize,

    #[arg(long, default_value_t = 1600)]
    pub samples_per_temperature: usize,

    #[arg(long, default_value_t = 500)]
    pub thermalization_sweeps: usize,

    #[arg(long, default_value_t = 10)]
    pub decorrelation_sweeps: usize,

    /// Seed for the Monte Carlo chains and the train/test shuffle.
    #[arg(long, default_value_t = 2018)]
    pub lattice_seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct CacheArgs {
    /// Directory holding the bincode sample cache.
    #[arg(long, env = "MLX_CACHE_DIR", default_value = "cache", value_name = "DIR")]
    pub cache_dir: PathBuf,

    /// Configurations kept in each of the train and test sets.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub n_samples: usize,

    #[command(flatten)]
    pub lattice: LatticeArgs,
}

#[derive(Debug, Args, Clone)]
pub struct IsingClassifyArgs {
    #[command(flatten)]
    pub cache: CacheArgs,

    /// Seed for network initialization and training.
    #[arg(long, default_value_t = 2019)]
    pub seed: u64,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct IsingCacheArgs {
    #[command(flatten)]
    pub cache: CacheArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Report JSON written with `--export`.
    #[arg(value_name = "JSON")]
    pub report: PathBuf,

    /// Print the report and plots instead of opening the viewer.
    #[arg(long)]
    pub print: bool,

    /// Plot width (columns) for `--print`.
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows) for `--print`.
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
