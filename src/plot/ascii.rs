//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series gets its own marker (`*`, `o`, `+`, `x`, `#`) at its data
//! points; consecutive points are joined with `.`.

use crate::domain::Figure;
use crate::plot::{pad_range, project_series, projected_bounds};

const MARKERS: [char; 5] = ['*', 'o', '+', 'x', '#'];

/// Marker used for the `i`-th series of a figure.
pub fn marker(i: usize) -> char {
    MARKERS[i % MARKERS.len()]
}

/// Render a figure on a `width × height` character grid with a header and legend.
pub fn render_ascii_figure(figure: &Figure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = String::new();
    out.push_str(&format!("Plot: {}\n", figure.title));

    let series = project_series(figure);
    let Some((x_bounds, y_bounds)) = projected_bounds(&series) else {
        out.push_str("(no plottable points)\n");
        return out;
    };
    let [x_min, x_max] = x_bounds;
    let (y_min, y_max) = pad_range(y_bounds[0], y_bounds[1], 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Connecting lines first so markers overlay them.
    for points in &series {
        let mut prev = None;
        for &(x, y) in points {
            let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, cell.0, cell.1, '.');
            }
            prev = Some(cell);
        }
    }
    for (i, points) in series.iter().enumerate() {
        for &(x, y) in points {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = marker(i);
        }
    }

    out.push_str(&format!(
        "x: {} [{}, {}] | y: {} [{}, {}]\n",
        figure.x_label,
        figure.x_scale.tick_label(x_min),
        figure.x_scale.tick_label(x_max),
        figure.y_label,
        figure.y_scale.tick_label(y_min),
        figure.y_scale.tick_label(y_max),
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let legend: Vec<String> = figure
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", marker(i), s.label))
        .collect();
    out.push_str(&format!("legend: {}\n", legend.join("  ")));

    out
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish); only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Scale, Series};

    fn figure(x_scale: Scale, y_scale: Scale, series: Vec<Series>) -> Figure {
        Figure {
            name: "golden".into(),
            title: "Golden".into(),
            x_label: "lambda".into(),
            y_label: "mse".into(),
            x_scale,
            y_scale,
            series,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let fig = figure(
            Scale::Linear,
            Scale::Linear,
            vec![
                Series::new("flat", vec![(0.0, 1.0), (9.0, 1.0)]),
                Series::new("rise", vec![(0.0, 0.0), (9.0, 2.0)]),
            ],
        );
        let txt = render_ascii_figure(&fig, 10, 5);
        let expected = concat!(
            "Plot: Golden\n",
            "x: lambda [0.000, 9.000] | y: mse [-0.100, 2.100]\n",
            "        .o\n",
            "      ..\n",
            "*........*\n",
            "  ..\n",
            "o.\n",
            "legend: * flat  o rise\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn log_axes_label_powers_of_ten() {
        let fig = figure(
            Scale::Log,
            Scale::Log,
            vec![Series::new("ridge", vec![(1e-3, 1e-2), (1e5, 1.0)])],
        );
        let txt = render_ascii_figure(&fig, 20, 6);
        assert!(txt.contains("x: lambda [1e-3, 1e5]"));
        // two markers plus the legend entry
        assert_eq!(txt.matches('*').count(), 3);
    }

    #[test]
    fn empty_figure_renders_placeholder() {
        let fig = figure(Scale::Log, Scale::Linear, vec![Series::new("s", vec![(0.0, 1.0)])]);
        assert_eq!(render_ascii_figure(&fig, 10, 5), "Plot: Golden\n(no plottable points)\n");
    }
}
