//! Test error of OLS, Ridge and Lasso as a function of the shrinkage parameter λ.
//!
//! One set of random 1D Ising chains is generated and split head/tail. OLS is
//! fitted once; Ridge and Lasso are fitted for every λ on a log grid, with the
//! grid points evaluated in parallel.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::{RegressionSplit, generate_regression_data, split_head};
use crate::domain::{Figure, LambdaSweepConfig, MetricRow, Report, Scale, Series};
use crate::error::AppError;
use crate::experiments::ExperimentRun;
use crate::math::log_space;
use crate::models::{LeastSquares, Method};
use crate::report::{mse, r2};

/// Test-set scores of one fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub mse: f64,
    pub r2: f64,
}

/// Ridge and Lasso scores at one λ.
#[derive(Debug, Clone, Copy)]
pub struct SweepPoint {
    pub lambda: f64,
    pub ridge: Score,
    pub lasso: Score,
}

/// Fit `method` with shrinkage `lambda` on the train part and score it on the test part.
pub fn evaluate(method: Method, lambda: f64, split: &RegressionSplit) -> Result<Score, AppError> {
    let mut model = LeastSquares::new(method).with_lambda(lambda)?;
    model.fit(&split.x_train, &split.y_train)?;
    let y_pred = model.predict(&split.x_test)?;
    Ok(Score {
        mse: mse(&split.y_test, &y_pred)?,
        r2: r2(&split.y_test, &y_pred)?,
    })
}

pub fn run(config: &LambdaSweepConfig) -> Result<ExperimentRun, AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let data = generate_regression_data(config.l, config.n, &mut rng)?;
    let split = split_head(&data.x, &data.y, config.train)?;
    let lambdas = log_space(config.lambda_min_exp, config.lambda_max_exp, config.lambda_steps)?;

    info!(
        l = config.l,
        n_train = split.x_train.nrows(),
        n_test = split.x_test.nrows(),
        lambdas = lambdas.len(),
        "lambda sweep"
    );

    let ols = evaluate(Method::Ols, 0.0, &split)?;

    let points = lambdas
        .par_iter()
        .map(|&lambda| {
            let ridge = evaluate(Method::Ridge, lambda, &split)?;
            let lasso = evaluate(Method::Lasso, lambda, &split)?;
            debug!(lambda, ridge_mse = ridge.mse, lasso_mse = lasso.mse, "sweep point");
            Ok(SweepPoint { lambda, ridge, lasso })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut report = Report::new("lambda")
        .param("l", config.l)
        .param("n", config.n)
        .param("train", config.train)
        .param(
            "lambda",
            format!(
                "logspace({}, {}, {})",
                config.lambda_min_exp, config.lambda_max_exp, config.lambda_steps
            ),
        )
        .param("seed", config.seed);

    report.metrics.push(MetricRow::regression("ols", None, ols.mse, ols.r2));
    for method in [Method::Ridge, Method::Lasso] {
        for p in &points {
            let s = score_of(p, method);
            report
                .metrics
                .push(MetricRow::regression(method.display_name().to_lowercase(), Some(p.lambda), s.mse, s.r2));
        }
    }

    report.figures.push(figure(
        "mse",
        "Test MSE vs shrinkage",
        "MSE",
        &lambdas,
        ols,
        &points,
        |s| s.mse,
    ));
    report.figures.push(figure(
        "one_minus_r2",
        "Test 1 - R² vs shrinkage",
        "1 - R²",
        &lambdas,
        ols,
        &points,
        |s| 1.0 - s.r2,
    ));

    Ok(ExperimentRun::new(report))
}

fn score_of(point: &SweepPoint, method: Method) -> Score {
    match method {
        Method::Lasso => point.lasso,
        _ => point.ridge,
    }
}

/// Log-log figure with OLS drawn as a flat line across the λ range.
fn figure(
    name: &str,
    title: &str,
    y_label: &str,
    lambdas: &[f64],
    ols: Score,
    points: &[SweepPoint],
    metric: impl Fn(&Score) -> f64,
) -> Figure {
    let first = lambdas.first().copied().unwrap_or(1.0);
    let last = lambdas.last().copied().unwrap_or(1.0);
    let series_for = |method: Method| {
        Series::new(
            method.display_name(),
            points.iter().map(|p| (p.lambda, metric(&score_of(p, method)))).collect(),
        )
    };

    Figure {
        name: name.to_string(),
        title: title.to_string(),
        x_label: "shrinkage parameter λ".to_string(),
        y_label: y_label.to_string(),
        x_scale: Scale::Log,
        y_scale: Scale::Log,
        series: vec![
            Series::new(Method::Ols.display_name(), vec![(first, metric(&ols)), (last, metric(&ols))]),
            series_for(Method::Ridge),
            series_for(Method::Lasso),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> LambdaSweepConfig {
        LambdaSweepConfig {
            l: 6,
            n: 300,
            train: 0.5,
            lambda_min_exp: -3.0,
            lambda_max_exp: 3.0,
            lambda_steps: 4,
            seed: 2018,
        }
    }

    #[test]
    fn sweep_produces_rows_and_figures() {
        let run = run(&small_config()).unwrap();
        let report = &run.report;

        // 1 OLS row + 4 ridge + 4 lasso
        assert_eq!(report.metrics.len(), 9);
        assert_eq!(report.figures.len(), 2);
        for row in &report.metrics {
            assert!(row.mse.unwrap().is_finite());
            assert!(row.r2.unwrap() <= 1.0);
        }

        let mse = &report.figures[0];
        assert_eq!(mse.series[0].label, "OLS");
        assert_eq!(mse.series[0].points.len(), 2);
        assert!((mse.series[0].points[0].0 - 1e-3).abs() < 1e-15);
        assert!((mse.series[0].points[1].0 - 1e3).abs() < 1e-9);
        assert_eq!(mse.series[1].points.len(), 4);
    }

    #[test]
    fn ols_is_near_exact_with_enough_samples() {
        // 150 training chains for 36 couplings: the energy is linear in the features.
        let run = run(&small_config()).unwrap();
        let ols = &run.report.metrics[0];
        assert!(ols.mse.unwrap() < 1e-10);
        assert!((ols.r2.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn heavy_shrinkage_hurts_ridge() {
        let run = run(&small_config()).unwrap();
        let ridge: Vec<&MetricRow> = run.report.metrics.iter().filter(|r| r.label == "ridge").collect();
        let first = ridge.first().unwrap().mse.unwrap();
        let last = ridge.last().unwrap().mse.unwrap();
        assert!(last > first);
    }

    #[test]
    fn sweep_is_deterministic() {
        let a = run(&small_config()).unwrap();
        let b = run(&small_config()).unwrap();
        assert_eq!(a.report.metrics, b.report.metrics);
    }
}
