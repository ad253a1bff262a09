//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - turns them into experiment configurations
//! - runs the selected experiment
//! - prints reports/plots and writes optional SVG/JSON outputs

use clap::Parser;
use tracing::info;

use crate::cli::{
    Command, DigitsArgs, IsingCacheArgs, IsingClassifyArgs, LambdaArgs, LatticeArgs, NetworkArgs,
    OutputArgs, ShowArgs, TrainSizeArgs,
};
use crate::domain::{
    DigitsConfig, IsingClassifyConfig, LambdaSweepConfig, LatticeConfig, NetworkConfig, OutputConfig,
    TrainSizeConfig,
};
use crate::error::AppError;
use crate::experiments::{self, present};

/// Entry point for the `mlx` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Lambda(args) => {
            let run = experiments::lambda::run(&lambda_config(&args))?;
            present(&run, &output_config(&args.output))
        }
        Command::TrainSize(args) => {
            let run = experiments::train_size::run(&train_size_config(&args))?;
            present(&run, &output_config(&args.output))
        }
        Command::Digits(args) => {
            let run = experiments::digits::run(&digits_config(&args))?;
            present(&run, &output_config(&args.output))
        }
        Command::IsingClassify(args) => {
            let run = experiments::ising_classify::run(&ising_classify_config(&args))?;
            present(&run, &output_config(&args.output))
        }
        Command::IsingCache(args) => handle_cache(&args),
        Command::Show(args) => handle_show(&args),
    }
}

fn handle_cache(args: &IsingCacheArgs) -> Result<(), AppError> {
    let lattice = lattice_config(&args.cache.lattice);
    let samples = crate::data::save_ising_smaller(&args.cache.cache_dir, args.cache.n_samples, &lattice)?;
    let path = crate::data::cache::cache_path(&args.cache.cache_dir, lattice.l, args.cache.n_samples);
    info!(path = %path.display(), "cache written");
    println!(
        "Wrote {} (train={}, test={}, critical={})",
        path.display(),
        samples.x_train.len(),
        samples.x_test.len(),
        samples.x_critical.len()
    );
    Ok(())
}

fn handle_show(args: &ShowArgs) -> Result<(), AppError> {
    let report = crate::io::read_report_json(&args.report)?;
    if !args.print {
        return crate::tui::run_viewer(&report);
    }
    println!("{}", crate::report::format_report(&report));
    for figure in &report.figures {
        println!("{}", crate::plot::render_ascii_figure(figure, args.width, args.height));
    }
    Ok(())
}

pub fn output_config(args: &OutputArgs) -> OutputConfig {
    OutputConfig {
        out_dir: args.out_dir.clone(),
        export: args.export.clone(),
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        show: args.show,
    }
}

pub fn lambda_config(args: &LambdaArgs) -> LambdaSweepConfig {
    LambdaSweepConfig {
        l: args.l,
        n: args.n,
        train: args.train,
        lambda_min_exp: args.lambda_min_exp,
        lambda_max_exp: args.lambda_max_exp,
        lambda_steps: args.lambda_steps,
        seed: args.seed,
    }
}

pub fn train_size_config(args: &TrainSizeArgs) -> TrainSizeConfig {
    TrainSizeConfig {
        l: args.l,
        n: args.n,
        m: args.m,
        train_min: args.train_min,
        train_max: args.train_max,
        seed: args.seed,
    }
}

pub fn digits_config(args: &DigitsArgs) -> DigitsConfig {
    let defaults = DigitsConfig::default();
    DigitsConfig {
        mnist_dir: args.mnist_dir.clone(),
        samples: args.samples,
        validation_share: args.validation_share,
        gallery_size: args.gallery_size,
        seed: args.seed,
        network: network_config(&args.network, defaults.network),
    }
}

pub fn ising_classify_config(args: &IsingClassifyArgs) -> IsingClassifyConfig {
    let defaults = IsingClassifyConfig::default();
    IsingClassifyConfig {
        n_samples: args.cache.n_samples,
        cache_dir: args.cache.cache_dir.clone(),
        lattice: lattice_config(&args.cache.lattice),
        seed: args.seed,
        network: network_config(&args.network, defaults.network),
    }
}

fn lattice_config(args: &LatticeArgs) -> LatticeConfig {
    LatticeConfig {
        l: args.l,
        samples_per_temperature: args.samples_per_temperature,
        thermalization_sweeps: args.thermalization_sweeps,
        decorrelation_sweeps: args.decorrelation_sweeps,
        seed: args.lattice_seed,
    }
}

/// Override `defaults` with every network flag that was given.
fn network_config(args: &NetworkArgs, defaults: NetworkConfig) -> NetworkConfig {
    NetworkConfig {
        hidden: args.hidden.clone().unwrap_or(defaults.hidden),
        epochs: args.epochs.unwrap_or(defaults.epochs),
        batch_size: args.batch_size.unwrap_or(defaults.batch_size),
        learning_rate: args.learning_rate.unwrap_or(defaults.learning_rate),
        lambda: args.lambda.unwrap_or(defaults.lambda),
        validation_fraction: args.validation_fraction.unwrap_or(defaults.validation_fraction),
        validation_skip: args.validation_skip.unwrap_or(defaults.validation_skip),
        optimizer: args.optimizer.unwrap_or(defaults.optimizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::OptimizerKind;

    fn parse(argv: &[&str]) -> Command {
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn network_defaults_depend_on_experiment() {
        let Command::Digits(args) = parse(&["mlx", "digits"]) else {
            panic!("expected digits");
        };
        let digits = digits_config(&args);
        assert_eq!(digits.network.hidden, vec![100, 50]);
        assert_eq!(digits.network.batch_size, 200);

        let Command::IsingClassify(args) = parse(&["mlx", "ising-classify", "--epochs", "5"]) else {
            panic!("expected ising-classify");
        };
        let ising = ising_classify_config(&args);
        assert_eq!(ising.network.hidden, vec![100]);
        assert_eq!(ising.network.batch_size, 500);
        assert_eq!(ising.network.epochs, 5);
        assert_eq!(ising.network.optimizer, OptimizerKind::Adam);
    }

    #[test]
    fn cli_defaults_match_config_defaults() {
        let Command::Lambda(args) = parse(&["mlx", "lambda"]) else {
            panic!("expected lambda");
        };
        let config = lambda_config(&args);
        let defaults = LambdaSweepConfig::default();
        assert_eq!((config.l, config.n, config.lambda_steps, config.seed), (defaults.l, defaults.n, defaults.lambda_steps, defaults.seed));

        let Command::TrainSize(args) = parse(&["mlx", "train-size"]) else {
            panic!("expected train-size");
        };
        let config = train_size_config(&args);
        assert_eq!((config.n, config.m, config.seed), (2000, 10, 2019));

        let Command::IsingCache(args) = parse(&["mlx", "ising-cache"]) else {
            panic!("expected ising-cache");
        };
        let lattice = lattice_config(&args.cache.lattice);
        assert_eq!(lattice.samples_per_temperature, LatticeConfig::default().samples_per_temperature);
    }

    #[test]
    fn no_plot_disables_ascii_output() {
        let Command::Lambda(args) = parse(&["mlx", "lambda", "--no-plot", "--width", "120"]) else {
            panic!("expected lambda");
        };
        let output = output_config(&args.output);
        assert!(!output.plot);
        assert_eq!(output.plot_width, 120);
    }
}
