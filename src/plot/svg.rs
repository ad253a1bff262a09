//! SVG output via Plotters.
//!
//! Three kinds of pictures are written:
//!
//! - line charts for [`Figure`]s (log axes are drawn in log10 space with
//!   `1eN` tick labels)
//! - grids of matrix heatmaps on the `seismic` colormap (coupling matrices)
//! - grids of grayscale images (misclassified digits)

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::Figure;
use crate::error::AppError;
use crate::plot::colormap::{gray_r, seismic};
use crate::plot::{pad_range, project_series, projected_bounds};

type DrawResult = Result<(), Box<dyn Error>>;

/// A matrix shown as one heatmap panel (row-major `values`).
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

/// A square grayscale image with pixel values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub title: String,
    pub side: usize,
    pub pixels: Vec<f64>,
}

const FIGURE_SIZE: (u32, u32) = (800, 600);
const PANEL_SIZE: u32 = 240;

fn render_error(path: &Path, err: Box<dyn Error>) -> AppError {
    AppError::runtime(format!("Failed to render {}: {err}", path.display()))
}

/// Write a line chart for `figure` to `path`.
pub fn render_figure_svg(figure: &Figure, path: &Path) -> Result<(), AppError> {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    draw_figure(&root, figure).map_err(|e| render_error(path, e))
}

fn draw_figure(root: &DrawingArea<SVGBackend, Shift>, figure: &Figure) -> DrawResult {
    root.fill(&WHITE)?;

    let series = project_series(figure);
    let Some((x, y)) = projected_bounds(&series) else {
        return Err(format!("figure '{}' has no plottable points", figure.name).into());
    };
    let (y0, y1) = pad_range(y[0], y[1], 0.05);

    let mut chart = ChartBuilder::on(root)
        .caption(&figure.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x[0]..x[1], y0..y1)?;

    let (x_scale, y_scale) = (figure.x_scale, figure.y_scale);
    chart
        .configure_mesh()
        .x_desc(&figure.x_label)
        .y_desc(&figure.y_label)
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&|v| x_scale.tick_label(*v))
        .y_label_formatter(&|v| y_scale.tick_label(*v))
        .draw()?;

    for (i, (s, points)) in figure.series.iter().zip(&series).enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Write heatmap panels in a grid with `grid_cols` columns, colored on `[lo, hi]`.
pub fn render_heatmaps_svg(
    panels: &[Heatmap],
    grid_cols: usize,
    (lo, hi): (f64, f64),
    path: &Path,
) -> Result<(), AppError> {
    for p in panels {
        if p.values.len() != p.rows * p.cols {
            return Err(AppError::data(format!(
                "Heatmap '{}' has {} values for a {}x{} grid.",
                p.title,
                p.values.len(),
                p.rows,
                p.cols
            )));
        }
    }
    let cells: Vec<CellPanel> = panels
        .iter()
        .map(|p| CellPanel {
            title: &p.title,
            rows: p.rows,
            cols: p.cols,
            colors: p.values.iter().map(|&v| seismic(v, lo, hi)).collect(),
        })
        .collect();
    render_panels(&cells, grid_cols, path)
}

/// Write images in a grid with `grid_cols` columns on the reversed gray map.
pub fn render_gallery_svg(images: &[GalleryImage], grid_cols: usize, path: &Path) -> Result<(), AppError> {
    for img in images {
        if img.pixels.len() != img.side * img.side {
            return Err(AppError::data(format!(
                "Image '{}' has {} pixels, expected {}.",
                img.title,
                img.pixels.len(),
                img.side * img.side
            )));
        }
    }
    let cells: Vec<CellPanel> = images
        .iter()
        .map(|img| CellPanel {
            title: &img.title,
            rows: img.side,
            cols: img.side,
            colors: img.pixels.iter().map(|&v| gray_r(v)).collect(),
        })
        .collect();
    render_panels(&cells, grid_cols, path)
}

/// A panel of pre-colored cells (row-major, row 0 at the top).
struct CellPanel<'a> {
    title: &'a str,
    rows: usize,
    cols: usize,
    colors: Vec<RGBColor>,
}

fn render_panels(panels: &[CellPanel<'_>], grid_cols: usize, path: &Path) -> Result<(), AppError> {
    if panels.is_empty() {
        return Err(AppError::data("Nothing to draw: no panels."));
    }
    let grid_cols = grid_cols.clamp(1, panels.len());
    let grid_rows = panels.len().div_ceil(grid_cols);
    let size = (PANEL_SIZE * grid_cols as u32, PANEL_SIZE * grid_rows as u32);

    let root = SVGBackend::new(path, size).into_drawing_area();
    draw_panels(&root, panels, (grid_rows, grid_cols)).map_err(|e| render_error(path, e))
}

fn draw_panels(
    root: &DrawingArea<SVGBackend, Shift>,
    panels: &[CellPanel<'_>],
    grid: (usize, usize),
) -> DrawResult {
    root.fill(&WHITE)?;
    let areas = root.split_evenly(grid);

    for (area, panel) in areas.iter().zip(panels) {
        let (rows, cols) = (panel.rows as f64, panel.cols as f64);
        let mut chart = ChartBuilder::on(area)
            .caption(panel.title, ("sans-serif", 14))
            .margin(6)
            .build_cartesian_2d(0.0..cols, 0.0..rows)?;

        chart.draw_series(panel.colors.iter().enumerate().map(|(k, color)| {
            let (i, j) = ((k / panel.cols) as f64, (k % panel.cols) as f64);
            // row 0 at the top
            Rectangle::new([(j, rows - i - 1.0), (j + 1.0, rows - i)], color.filled())
        }))?;
    }

    root.present()?;
    Ok(())
}
