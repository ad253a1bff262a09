//! Ratatui-based report viewer.
//!
//! Shows one figure of a [`Report`] at a time next to its metrics table.
//! `←`/`→` switch figures, `q` or `Esc` quits. The terminal is restored on
//! exit, including on errors.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::domain::{Figure, Report, Scale, log_tick};
use crate::error::AppError;
use crate::plot::{pad_range, project_series, projected_bounds};

mod plotters_chart;

use plotters_chart::{FigureChart, series_color};

/// Open the viewer for `report` and block until the user quits.
pub fn run_viewer(report: &Report) -> Result<(), AppError> {
    if report.figures.is_empty() {
        return Err(AppError::data(format!(
            "Report '{}' has no figures to show.",
            report.experiment
        )));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut viewer = Viewer::new(report);
    viewer.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct Viewer<'a> {
    report: &'a Report,
    selected: usize,
}

/// Projected series and padded bounds for one figure.
struct ChartData {
    series: Vec<Vec<(f64, f64)>>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_data(figure: &Figure) -> Option<ChartData> {
    let series = project_series(figure);
    let (x_bounds, y) = projected_bounds(&series)?;
    let (y0, y1) = pad_range(y[0], y[1], 0.05);
    Some(ChartData {
        series,
        x_bounds,
        y_bounds: [y0, y1],
    })
}

impl<'a> Viewer<'a> {
    fn new(report: &'a Report) -> Self {
        Self { report, selected: 0 }
    }

    fn figure(&self) -> &'a Figure {
        &self.report.figures[self.selected]
    }

    fn next(&mut self) {
        self.selected = (self.selected + 1) % self.report.figures.len();
    }

    fn previous(&mut self) {
        let n = self.report.figures.len();
        self.selected = (self.selected + n - 1) % n;
    }

    /// Returns `true` when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => self.next(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => self.previous(),
            _ => {}
        }
        false
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let params: Vec<String> = self.report.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let lines = vec![
            Line::from(vec![
                Span::styled(&self.report.tool, Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " {} | {}",
                    self.report.experiment,
                    self.report.created.format("%Y-%m-%d %H:%M:%S")
                )),
            ]),
            Line::from(Span::styled(params.join(" | "), Style::default().fg(Color::Gray))),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_metrics(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let figure = self.figure();
        let title = format!(
            "{} ({}/{})",
            figure.title,
            self.selected + 1,
            self.report.figures.len()
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = chart_data(figure) else {
            let msg = Paragraph::new("No plottable points.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = FigureChart {
            series: &data.series,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: &figure.x_label,
            y_label: &figure.y_label,
            x_scale: figure.x_scale,
            y_scale: figure.y_scale,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            let axes = Axes {
                y_label: &figure.y_label,
                x_bounds: data.x_bounds,
                y_bounds: data.y_bounds,
                x_scale: figure.x_scale,
                y_scale: figure.y_scale,
            };
            draw_axis_ticks(frame, inner, chart_rect, insets, &axes);
        }
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::from(Span::styled(
            "Legend",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, s) in self.figure().series.iter().enumerate() {
            let (r, g, b) = series_color(i);
            lines.push(Line::from(vec![
                Span::styled("── ", Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(s.label.clone()),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Metrics",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for row in &self.report.metrics {
            let mut text = row.label.clone();
            if let Some(p) = row.param {
                text.push_str(&format!(" @ {p:.3e}"));
            }
            if let Some(v) = row.mse {
                text.push_str(&format!(" mse={v:.3e}"));
            }
            if let Some(v) = row.r2 {
                text.push_str(&format!(" r2={v:.4}"));
            }
            if let Some(v) = row.accuracy {
                text.push_str(&format!(" acc={v:.4}"));
            }
            lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Gray))));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Report").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ switch figure  q quit";
        let p = Paragraph::new(Line::from(Span::styled(help, Style::default().fg(Color::Gray))))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

/// Bounds (in projected space) and scales used to label the axes.
struct Axes<'a> {
    y_label: &'a str,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_scale: Scale,
    y_scale: Scale,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: Rect, insets: AxisInsets, axes: &Axes<'_>) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = axes.x_bounds[0] + u * (axes.x_bounds[1] - axes.x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = short_tick(axes.x_scale, x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = axes.y_bounds[0] + u * (axes.y_bounds[1] - axes.y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = short_tick(axes.y_scale, y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let y_label = Paragraph::new(axes.y_label)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.min(insets.left + 20),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

/// Compact tick label: `1e-3` on log axes, 4 significant digits otherwise.
fn short_tick(scale: Scale, projected: f64) -> String {
    match scale {
        Scale::Log => log_tick(projected),
        Scale::Linear => {
            if projected != 0.0 && (projected.abs() >= 1e4 || projected.abs() < 1e-2) {
                format!("{projected:.1e}")
            } else {
                format!("{projected:.2}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;

    fn report_with(n: usize) -> Report {
        let mut report = Report::new("lambda");
        for i in 0..n {
            report.figures.push(Figure {
                name: format!("f{i}"),
                title: format!("Figure {i}"),
                x_label: "x".into(),
                y_label: "y".into(),
                x_scale: Scale::Log,
                y_scale: Scale::Linear,
                series: vec![Series::new("s", vec![(1.0, 1.0), (100.0, 3.0)])],
            });
        }
        report
    }

    #[test]
    fn arrow_keys_cycle_figures() {
        let report = report_with(3);
        let mut viewer = Viewer::new(&report);
        assert!(!viewer.handle_key(KeyCode::Right));
        assert_eq!(viewer.selected, 1);
        viewer.handle_key(KeyCode::Left);
        viewer.handle_key(KeyCode::Left);
        assert_eq!(viewer.selected, 2);
        viewer.handle_key(KeyCode::Right);
        assert_eq!(viewer.selected, 0);
        assert!(viewer.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn chart_data_uses_projected_bounds() {
        let report = report_with(1);
        let data = chart_data(&report.figures[0]).unwrap();
        assert_eq!(data.x_bounds, [0.0, 2.0]);
        assert!(data.y_bounds[0] < 1.0 && data.y_bounds[1] > 3.0);
    }

    #[test]
    fn layout_reserves_axis_space() {
        let (rect, insets) = chart_layout(Rect::new(0, 0, 80, 30));
        assert!(insets.is_some());
        assert_eq!(rect, Rect::new(9, 1, 69, 27));

        let (rect, insets) = chart_layout(Rect::new(0, 0, 15, 5));
        assert!(insets.is_none());
        assert_eq!(rect, Rect::new(0, 0, 15, 5));
    }

    #[test]
    fn tick_labels_stay_short() {
        assert_eq!(short_tick(Scale::Log, -3.0), "1e-3");
        assert_eq!(short_tick(Scale::Log, 2.3), "199.53");
        assert_eq!(short_tick(Scale::Linear, 12.5), "12.50");
        assert_eq!(short_tick(Scale::Linear, 25000.0), "2.5e4");
        assert_eq!(short_tick(Scale::Linear, 0.0), "0.00");
    }
}
