//! Experiment pipelines.
//!
//! Every experiment is a straight line: generate or load data, split, fit,
//! evaluate, and assemble a [`Report`] plus optional image panels. The shared
//! [`present`] step then prints the report, draws ASCII plots, writes SVG
//! figures and JSON exports, and opens the viewer when asked.

pub mod digits;
pub mod ising_classify;
pub mod lambda;
pub mod train_size;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::domain::{Figure, NetworkConfig, OptimizerKind, OutputConfig, Report, Scale, Series};
use crate::error::AppError;
use crate::models::{Activation, Cost, FitOptions, NeuralNetwork, Optimizer, TrainingHistory};
use crate::plot::{self, GalleryImage, Heatmap};

/// Image panels that accompany a report (written as SVG only).
#[derive(Debug, Clone)]
pub enum Panels {
    /// Matrices on the diverging colormap over `range`.
    Heatmaps {
        name: String,
        grid_cols: usize,
        range: (f64, f64),
        panels: Vec<Heatmap>,
    },
    /// Grayscale images.
    Gallery {
        name: String,
        grid_cols: usize,
        images: Vec<GalleryImage>,
    },
}

/// Everything an experiment produced.
#[derive(Debug, Clone)]
pub struct ExperimentRun {
    pub report: Report,
    pub panels: Vec<Panels>,
}

impl ExperimentRun {
    pub fn new(report: Report) -> Self {
        Self {
            report,
            panels: Vec::new(),
        }
    }
}

/// Print, plot, write and optionally show a finished run.
pub fn present(run: &ExperimentRun, output: &OutputConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_report(&run.report));

    if output.plot {
        for figure in &run.report.figures {
            println!(
                "{}",
                plot::render_ascii_figure(figure, output.plot_width, output.plot_height)
            );
        }
    }

    if let Some(dir) = &output.out_dir {
        let written = write_svgs(run, dir)?;
        for path in &written {
            println!("Wrote {}", path.display());
        }
    }

    if let Some(path) = &output.export {
        crate::io::write_report_json(path, &run.report)?;
        info!(path = %path.display(), "exported report");
    }

    if output.show {
        crate::tui::run_viewer(&run.report)?;
    }

    Ok(())
}

/// Write every figure and panel set to `dir` as `{experiment}_{name}_{timestamp}.svg`.
pub fn write_svgs(run: &ExperimentRun, dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::runtime(format!("Failed to create output directory '{}': {e}", dir.display())))?;

    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let file = |name: &str| dir.join(format!("{}_{name}_{stamp}.svg", run.report.experiment));

    let mut written = Vec::new();
    for figure in &run.report.figures {
        let path = file(&figure.name);
        plot::render_figure_svg(figure, &path)?;
        written.push(path);
    }
    for panels in &run.panels {
        match panels {
            Panels::Heatmaps {
                name,
                grid_cols,
                range,
                panels,
            } => {
                let path = file(name);
                plot::render_heatmaps_svg(panels, *grid_cols, *range, &path)?;
                written.push(path);
            }
            Panels::Gallery {
                name,
                grid_cols,
                images,
            } => {
                if images.is_empty() {
                    continue;
                }
                let path = file(name);
                plot::render_gallery_svg(images, *grid_cols, &path)?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

/// Sigmoid hidden layers from `config.hidden`, then a softmax output trained on cross-entropy.
pub(crate) fn build_classifier(
    inputs: usize,
    outputs: usize,
    config: &NetworkConfig,
    seed: u64,
) -> Result<NeuralNetwork, AppError> {
    let mut nn = NeuralNetwork::new(inputs, outputs, Cost::CrossEntropy, seed)?;
    for &neurons in &config.hidden {
        nn.add_layer(Activation::Sigmoid, neurons)?;
    }
    nn.add_output_layer(Activation::Softmax)?;
    Ok(nn)
}

pub(crate) fn fit_options(config: &NetworkConfig, seed: u64) -> FitOptions {
    let optimizer = match config.optimizer {
        OptimizerKind::Sgd => Optimizer::sgd(config.learning_rate),
        OptimizerKind::Adam => Optimizer::adam(config.learning_rate),
    };
    FitOptions {
        batch_size: config.batch_size,
        epochs: config.epochs,
        validation_fraction: config.validation_fraction,
        validation_skip: config.validation_skip,
        optimizer,
        lambda: config.lambda,
        seed,
    }
}

/// Mean training cost per epoch, with validation cost where it was evaluated.
pub(crate) fn training_figure(history: &TrainingHistory) -> Figure {
    let train = history.epochs.iter().map(|e| (e.epoch as f64, e.train_cost)).collect();
    let validation = history
        .epochs
        .iter()
        .filter_map(|e| Some((e.epoch as f64, e.validation_cost?)))
        .collect();
    Figure {
        name: "training".to_string(),
        title: "Training cost per epoch".to_string(),
        x_label: "epoch".to_string(),
        y_label: "cross-entropy".to_string(),
        x_scale: Scale::Linear,
        y_scale: Scale::Log,
        series: vec![Series::new("train", train), Series::new("validation", validation)],
    }
}
