//! Report files: the at-risk table, the empty placeholder, the error report.

mod common;

use atrisk_core::{
    attribute_risk,
    diagnostics::overlap,
    io::{csv::read_csv_file, report, workbook::Workbook},
    AttributionConfig, Value,
};
use chrono::NaiveDate;
use common::*;

fn at(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .expect("valid timestamp")
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("atrisk-{}-{name}", std::process::id()))
}

#[test]
fn output_name_carries_generation_time() {
    assert_eq!(
        report::output_file_name(at(14, 5, 9), "csv"),
        "at_risk_stops_20240301_140509.csv"
    );
}

#[test]
fn marked_result_is_written_as_is() {
    let result = attribute_risk(
        &stops(&[("H1", "R1", 1), ("H1", "R1", 2)]),
        &predictions(&[("H1", "R1", 1)]),
        &AttributionConfig::two_key(),
    )
    .unwrap();

    let table = report::report_table(&result).unwrap();
    assert_eq!(table, result.table);

    let path = temp_path("marked.csv");
    report::write_table(&path, &table).unwrap();
    let back = read_csv_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(back.columns(), table.columns());
    assert_eq!(column(&back, "visit_sequence"), ints(&[2]));
}

#[test]
fn empty_result_gets_placeholder_row() {
    let result = attribute_risk(
        &stops(&[("H1", "R1", 1)]),
        &predictions(&[("H9", "R1", 1)]),
        &AttributionConfig::two_key(),
    )
    .unwrap();

    let table = report::report_table(&result).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.columns().last().map(String::as_str), Some(report::PROCESS_STATUS));
    let status = table.get(0, report::PROCESS_STATUS).unwrap().to_string();
    assert!(status.starts_with(report::NO_AT_RISK_STOPS), "{status}");
    assert!(status.contains("no prediction matched"), "{status}");
}

#[test]
fn json_output_is_a_one_sheet_workbook() {
    let result = attribute_risk(
        &stops(&[("H1", "R1", 1)]),
        &predictions(&[("H1", "R1", 1)]),
        &AttributionConfig::two_key(),
    )
    .unwrap();

    let path = temp_path("marked.json");
    report::write_table(&path, &result.table).unwrap();
    let book = Workbook::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(book.sheet(report::OUTPUT_SHEET).unwrap(), &result.table);
}

#[test]
fn error_report_names_input_and_time() {
    let table = report::error_report("bad input", "in.json", at(9, 0, 0)).unwrap();
    assert_eq!(table.columns(), ["error", "input_file", "timestamp"]);
    assert_eq!(table.rows()[0][2], Value::from("2024-03-01 09:00:00"));
}

#[test]
fn summary_explains_empty_result() {
    let result = attribute_risk(
        &stops(&[("H1", "R1", 1)]),
        &predictions(&[("H9", "R1", 1)]),
        &AttributionConfig::two_key(),
    )
    .unwrap();

    let lines = report::summary_lines(&result.diagnostics, result.outcome);
    assert!(lines.iter().any(|l| l.contains("unmatched: Hub: H9, Trip Ref: R1")));
    assert!(lines.iter().any(|l| l.contains(report::NO_AT_RISK_STOPS)));
}

#[test]
fn overlap_reports_common_key_values() {
    let config = AttributionConfig::two_key();
    let key_overlap = overlap(
        &stops(&[("H1", "R1", 1), ("H2", "R2", 1)]),
        &predictions(&[("H1", "R2", 1), ("H3", "R3", 0)]),
        &config,
    )
    .unwrap();

    let hubs = &key_overlap.columns[0];
    assert_eq!(hubs.stop_column, "hub");
    assert_eq!(hubs.prediction_column, "Hub");
    assert_eq!((hubs.stop_distinct, hubs.prediction_distinct), (2, 2));
    assert_eq!(hubs.common.len(), 1);
    let refs = &key_overlap.columns[1];
    assert_eq!(refs.common.iter().map(|v| v.to_string()).collect::<Vec<_>>(), ["R2"]);

    let lines = report::overlap_lines(&key_overlap);
    assert!(lines[0].contains("1 common"));
}
