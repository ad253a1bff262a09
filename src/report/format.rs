//! Formatted terminal output for finished runs.
//!
//! Tables are plain text with trailing whitespace trimmed, so they can be
//! compared verbatim in tests.

use crate::domain::{MetricRow, Report};

/// Format the run header, parameters and metrics table.
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} - {} ===\n", report.tool, report.experiment));
    out.push_str(&format!("Created: {}\n", report.created.format("%Y-%m-%d %H:%M:%S")));
    if !report.params.is_empty() {
        let params: Vec<String> = report.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(&format!("Params: {}\n", params.join(" | ")));
    }
    out.push('\n');
    out.push_str(&format_metrics_table(&report.metrics));
    out
}

/// Format metric rows; only columns that some row fills are printed.
pub fn format_metrics_table(rows: &[MetricRow]) -> String {
    let has_param = rows.iter().any(|r| r.param.is_some());
    let has_regression = rows.iter().any(|r| r.mse.is_some() || r.r2.is_some());
    let has_accuracy = rows.iter().any(|r| r.accuracy.is_some());

    let mut header = format!("{:<12}", "model");
    let mut rule = format!("{:-<12}", "");
    if has_param {
        header.push_str(&format!(" {:>12}", "param"));
        rule.push_str(&format!(" {:-<12}", ""));
    }
    if has_regression {
        header.push_str(&format!(" {:>12} {:>12}", "mse", "r2"));
        rule.push_str(&format!(" {:-<12} {:-<12}", "", ""));
    }
    if has_accuracy {
        header.push_str(&format!(" {:>10}", "accuracy"));
        rule.push_str(&format!(" {:-<10}", ""));
    }

    let mut out = String::new();
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for r in rows {
        let mut line = format!("{:<12}", truncate(&r.label, 12));
        if has_param {
            line.push_str(&format!(" {:>12}", fmt_opt(r.param, fmt_param)));
        }
        if has_regression {
            line.push_str(&format!(
                " {:>12} {:>12}",
                fmt_opt(r.mse, fmt_sci),
                fmt_opt(r.r2, |v| format!("{v:.6}"))
            ));
        }
        if has_accuracy {
            line.push_str(&format!(" {:>10}", fmt_opt(r.accuracy, |v| format!("{v:.4}"))));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_opt(v: Option<f64>, f: impl Fn(f64) -> String) -> String {
    v.map(f).unwrap_or_else(|| "-".to_string())
}

fn fmt_param(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e6 {
        format!("{v:.0}")
    } else {
        fmt_sci(v)
    }
}

fn fmt_sci(v: f64) -> String {
    format!("{v:.3e}")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_table_snapshot() {
        let rows = vec![
            MetricRow::regression("ols", None, 0.5, 0.25),
            MetricRow::regression("ridge", Some(0.001), 0.125, 0.75),
        ];
        let expected = concat!(
            "model               param          mse           r2\n",
            "------------ ------------ ------------ ------------\n",
            "ols                     -     5.000e-1     0.250000\n",
            "ridge            1.000e-3     1.250e-1     0.750000\n",
        );
        assert_eq!(format_metrics_table(&rows), expected);
    }

    #[test]
    fn classification_table_omits_regression_columns() {
        let rows = vec![
            MetricRow::classification("test", 0.99),
            MetricRow::classification("critical-set", 0.5),
        ];
        let txt = format_metrics_table(&rows);
        assert!(!txt.contains("mse"));
        assert!(txt.contains("critical-set"));
        assert!(txt.contains("0.9900"));
    }

    #[test]
    fn report_header_lists_params() {
        let report = Report::new("lambda").param("l", 40).param("n", 1000);
        let txt = format_report(&report);
        assert!(txt.starts_with("=== mlx - lambda ===\n"));
        assert!(txt.contains("Params: l=40 | n=1000\n"));
    }
}
