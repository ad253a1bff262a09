//! Read/write report JSON files.
//!
//! A report JSON is the portable record of one experiment run:
//! - experiment name, creation time and effective parameters
//! - the metrics table
//! - every figure with its raw series, so `mlx show` can redraw it
//!
//! The schema is defined by `domain::Report`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::Report;
use crate::error::AppError;

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &Report) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::runtime(format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .map_err(|e| AppError::runtime(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<Report, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data(format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: Report =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| AppError::data(format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
