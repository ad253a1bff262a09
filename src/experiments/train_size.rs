//! OLS test error as a function of the training set size.
//!
//! For every training fraction a fresh set of chains is generated (each sweep
//! point with its own seeded RNG) and an OLS fit is scored on the tail of the
//! data. The fitted coefficients are reshaped into `L × L` coupling matrices
//! and shown as heatmap panels in a `⌊√M⌋ × ⌊√M⌋` grid.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::{generate_regression_data, split_head};
use crate::domain::{Figure, MetricRow, Report, Scale, Series, TrainSizeConfig};
use crate::error::AppError;
use crate::experiments::{ExperimentRun, Panels};
use crate::math::lin_space;
use crate::models::{LeastSquares, Method};
use crate::plot::Heatmap;
use crate::report::{mse, r2};

/// Scores and coupling matrix for one training fraction.
#[derive(Debug, Clone)]
pub struct SizePoint {
    pub train: f64,
    /// `train · n`, the x coordinate of the error plot.
    pub size: f64,
    pub mse: f64,
    pub r2: f64,
    /// Row-major `L × L` coefficients.
    pub coupling: Vec<f64>,
}

/// Side of the square panel grid for `m` sweep points.
pub fn panel_grid_side(m: usize) -> usize {
    (m as f64).sqrt().floor() as usize
}

fn fit_point(config: &TrainSizeConfig, idx: usize, train: f64) -> Result<SizePoint, AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(idx as u64));
    let data = generate_regression_data(config.l, config.n, &mut rng)?;
    let split = split_head(&data.x, &data.y, train)?;

    let mut ols = LeastSquares::new(Method::Ols);
    let beta = ols.fit(&split.x_train, &split.y_train)?;
    let y_pred = ols.predict(&split.x_test)?;

    let point = SizePoint {
        train,
        size: train * config.n as f64,
        mse: mse(&split.y_test, &y_pred)?,
        r2: r2(&split.y_test, &y_pred)?,
        // column c of the design matrix is s[c / L]·s[c % L], so β is already row-major
        coupling: beta.iter().copied().collect(),
    };
    debug!(train, mse = point.mse, r2 = point.r2, "training size point");
    Ok(point)
}

pub fn run(config: &TrainSizeConfig) -> Result<ExperimentRun, AppError> {
    if config.m == 0 {
        return Err(AppError::usage("Number of training sizes must be > 0."));
    }
    let fractions = lin_space(config.train_min, config.train_max, config.m)?;
    info!(l = config.l, n = config.n, m = config.m, "training size sweep");

    let points = fractions
        .par_iter()
        .enumerate()
        .map(|(idx, &train)| fit_point(config, idx, train))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut report = Report::new("train-size")
        .param("l", config.l)
        .param("n", config.n)
        .param("m", config.m)
        .param("train", format!("linspace({}, {}, {})", config.train_min, config.train_max, config.m))
        .param("seed", config.seed);

    for p in &points {
        report
            .metrics
            .push(MetricRow::regression("ols", Some(p.size), p.mse, p.r2));
    }

    report.figures.push(Figure {
        name: "errors".to_string(),
        title: "OLS test error vs training set size".to_string(),
        x_label: "training data size".to_string(),
        y_label: "MSE and 1 - R²".to_string(),
        x_scale: Scale::Linear,
        y_scale: Scale::Log,
        series: vec![
            Series::new("MSE", points.iter().map(|p| (p.size, p.mse)).collect()),
            Series::new("1 - R²", points.iter().map(|p| (p.size, 1.0 - p.r2)).collect()),
        ],
    });

    let side = panel_grid_side(config.m);
    let skipped = config.m - side * side;
    if skipped > 0 {
        info!(skipped, "training sizes beyond the panel grid are not drawn");
    }
    let panels = points
        .iter()
        .take(side * side)
        .map(|p| Heatmap {
            title: format!("{:.3}", p.size),
            rows: config.l,
            cols: config.l,
            values: p.coupling.clone(),
        })
        .collect();

    let mut run = ExperimentRun::new(report);
    run.panels.push(Panels::Heatmaps {
        name: "coupling".to_string(),
        grid_cols: side,
        range: (-1.0, 1.0),
        panels,
    });
    Ok(run)
}
