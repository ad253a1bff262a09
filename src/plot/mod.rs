//! Figure rendering.
//!
//! - `ascii`: deterministic character plots for the terminal
//! - `svg`: line charts, heatmap panels and image galleries written with Plotters
//! - `colormap`: the diverging and grayscale maps used by the SVG panels

pub mod ascii;
pub mod colormap;
pub mod svg;

pub use ascii::render_ascii_figure;
pub use svg::{GalleryImage, Heatmap, render_figure_svg, render_gallery_svg, render_heatmaps_svg};

use crate::domain::Figure;

/// Series points projected onto the figure's axis scales.
///
/// Points that cannot be shown (non-finite, or non-positive on a log axis) are dropped.
pub(crate) fn project_series(figure: &Figure) -> Vec<Vec<(f64, f64)>> {
    figure
        .series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter_map(|&(x, y)| Some((figure.x_scale.project(x)?, figure.y_scale.project(y)?)))
                .collect()
        })
        .collect()
}

/// Bounds `([x0, x1], [y0, y1])` over all projected points.
///
/// Degenerate spans are widened so the ranges are always non-empty.
pub(crate) fn projected_bounds(series: &[Vec<(f64, f64)>]) -> Option<([f64; 2], [f64; 2])> {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for &(px, py) in series.iter().flatten() {
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    if !(x[0].is_finite() && y[0].is_finite()) {
        return None;
    }
    Some((widen(x), widen(y)))
}

fn widen(r: [f64; 2]) -> [f64; 2] {
    if r[1] > r[0] { r } else { [r[0] - 0.5, r[1] + 0.5] }
}

/// Pad a range by `frac` of its span on both sides.
pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}
