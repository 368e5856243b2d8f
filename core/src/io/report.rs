//! Output reports: the at-risk table, the empty-result placeholder, the
//! error report, and the human-readable run summary.

use crate::{
    attribution::Attribution,
    diagnostics::{Diagnostics, KeyOverlap, Outcome},
    error::AttributionResult,
    io::{csv, workbook::Workbook},
    table::{Table, Value},
};
use chrono::NaiveDateTime;
use std::path::Path;

pub const OUTPUT_SHEET: &str = "AtRiskStops";
pub const PROCESS_STATUS: &str = "process_status";
pub const NO_AT_RISK_STOPS: &str = "No at-risk stops found";

/// `at_risk_stops_YYYYmmdd_HHMMSS.<extension>`
pub fn output_file_name(generated_at: NaiveDateTime, extension: &str) -> String {
    format!(
        "at_risk_stops_{}.{extension}",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// The table to write for a run. An empty result still produces a file: one
/// placeholder row whose `process_status` says why nothing was marked.
pub fn report_table(attribution: &Attribution) -> AttributionResult<Table> {
    let reason = match attribution.outcome {
        Outcome::Marked => return Ok(attribution.table.clone()),
        Outcome::NoAtRiskStops(reason) => reason,
    };
    let mut columns = attribution.columns().to_vec();
    columns.push(PROCESS_STATUS.to_string());
    let mut row = vec![Value::Null; columns.len()];
    if let Some(last) = row.last_mut() {
        *last = Value::from(format!("{NO_AT_RISK_STOPS} ({})", reason.describe()));
    }
    let mut table = Table::new(columns);
    table.push_row(row)?;
    Ok(table)
}

/// Single-row report written in place of the output when a run fails.
pub fn error_report(
    error: &str,
    input_file: &str,
    timestamp: NaiveDateTime,
) -> AttributionResult<Table> {
    let mut table = Table::new(["error", "input_file", "timestamp"]);
    table.push_row(vec![
        Value::from(error),
        Value::from(input_file),
        Value::from(timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
    ])?;
    Ok(table)
}

/// Write a table as CSV, or as a one-sheet workbook when the path ends in `.json`.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> AttributionResult<()> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "json") {
        Workbook::new()
            .with_sheet(OUTPUT_SHEET, table.clone())
            .save(path)
    } else {
        csv::write_csv_file(path, table)
    }
}

pub fn summary_lines(diagnostics: &Diagnostics, outcome: Outcome) -> Vec<String> {
    let mut lines = vec![
        format!("  stop rows:               {}", diagnostics.stop_rows),
        format!("  prediction rows:         {}", diagnostics.prediction_rows),
        format!("  trips with defaults:     {}", diagnostics.predictions_with_defaults),
        format!("  trips matched:           {}", diagnostics.matched_trips),
        format!("  trips unmatched:         {}", diagnostics.unmatched_count()),
        format!("  stops marked at risk:    {}", diagnostics.stops_marked),
        format!("  rows skipped:            {}", diagnostics.row_issues.len()),
    ];
    for key in &diagnostics.unmatched_trips {
        lines.push(format!("    unmatched: {key}"));
    }
    for issue in &diagnostics.row_issues {
        lines.push(format!(
            "    skipped {} row {} ({}): {}",
            issue.table, issue.row, issue.column, issue.reason
        ));
    }
    if let Outcome::NoAtRiskStops(reason) = outcome {
        lines.push(format!("  {NO_AT_RISK_STOPS}: {}", reason.describe()));
        lines.push("  Check that reference numbers match between the files,".to_string());
        lines.push("  that some defaults are predicted, and that hub names match.".to_string());
    }
    lines
}

pub fn overlap_lines(overlap: &KeyOverlap) -> Vec<String> {
    let mut lines = Vec::new();
    for column in &overlap.columns {
        lines.push(format!(
            "  {} / {}: {} in stops, {} in predictions, {} common",
            column.stop_column,
            column.prediction_column,
            column.stop_distinct,
            column.prediction_distinct,
            column.common.len()
        ));
        if !column.common.is_empty() {
            let common: Vec<String> = column.common.iter().map(|v| v.to_string()).collect();
            lines.push(format!("    common: {}", common.join(", ")));
        }
    }
    lines
}
