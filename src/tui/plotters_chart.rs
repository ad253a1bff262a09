//! Plotters-powered figure widget for Ratatui.
//!
//! Plotters draws the axes, mesh and line series; `plotters-ratatui-backend`
//! turns its primitives into Ratatui canvas cells.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::Scale;

/// High-contrast series colors (cyan, yellow, magenta, green, red).
pub const SERIES_COLORS: [(u8, u8, u8); 5] = [
    (0, 255, 255),
    (255, 255, 0),
    (255, 0, 255),
    (0, 255, 0),
    (255, 64, 64),
];

pub fn series_color(i: usize) -> (u8, u8, u8) {
    SERIES_COLORS[i % SERIES_COLORS.len()]
}

/// A render-only description of one figure; all points are already projected
/// onto the axis scales.
pub struct FigureChart<'a> {
    pub series: &'a [Vec<(f64, f64)>],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub x_scale: Scale,
    pub y_scale: Scale,
}

impl Widget for FigureChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines clutter low-resolution terminal rendering; axes are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| self.x_scale.tick_label(*v))
                .y_label_formatter(&|v| self.y_scale.tick_label(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(WHITE)
                .bold_line_style(WHITE)
                .draw()?;

            for (i, points) in self.series.iter().enumerate() {
                let (r, g, b) = series_color(i);
                let color = RGBColor(r, g, b);
                chart.draw_series(LineSeries::new(points.iter().copied(), color))?;
                // `Circle` radii are mis-scaled by the ratatui backend; pixels mark the data points.
                chart.draw_series(points.iter().map(|&p| Pixel::new(p, WHITE)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
