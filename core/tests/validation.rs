//! Schema checks and row-level value handling under both policies.

mod common;

use atrisk_core::{
    attribute_risk, AttributionConfig, AttributionError, KeyColumn, KeySpec, Table, Value,
    ValuePolicy,
};
use common::*;

fn prediction_row(hub: Value, trip_ref: &str, defaults: Value) -> Vec<Value> {
    vec![
        hub,
        Value::from(trip_ref),
        defaults,
        Value::Float(0.1),
        Value::Float(0.2),
        Value::from("2024-03-01 08:00:00"),
    ]
}

fn prediction_table(rows: Vec<Vec<Value>>) -> Table {
    let mut table =
        Table::new(["Hub", "trip_trip_ref_number", "Defaults", "avg DRR", "Max DRR", "Time"]);
    for row in rows {
        table.push_row(row).unwrap();
    }
    table
}

fn good_stops() -> Table {
    stops(&[("H1", "R1", 1), ("H1", "R1", 2), ("H1", "R1", 3)])
}

// ─────────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_stop_columns_are_listed() {
    let stop_table = Table::new(["hub", "customer_name"]);
    let err = attribute_risk(
        &stop_table,
        &predictions(&[("H1", "R1", 1)]),
        &AttributionConfig::two_key(),
    )
    .unwrap_err();

    match err {
        AttributionError::Schema { table, missing } => {
            assert_eq!(table, "Stops");
            assert_eq!(missing, vec!["trip_trip_ref_number", "visit_sequence"]);
        }
        other => panic!("expected schema error, got {other}"),
    }
}

#[test]
fn missing_prediction_columns_are_listed() {
    let prediction_table = Table::new(["Hub", "trip_trip_ref_number", "Defaults"]);
    let err = attribute_risk(&good_stops(), &prediction_table, &AttributionConfig::two_key())
        .unwrap_err();

    match err {
        AttributionError::Schema { table, missing } => {
            assert_eq!(table, "Predictions");
            assert_eq!(missing, vec!["avg DRR", "Max DRR", "Time"]);
        }
        other => panic!("expected schema error, got {other}"),
    }
}

#[test]
fn three_key_mode_requires_trip_id_on_both_sides() {
    let err = attribute_risk(
        &good_stops(),
        &predictions(&[("H1", "R1", 1)]),
        &AttributionConfig::three_key(),
    )
    .unwrap_err();
    assert!(matches!(err, AttributionError::Schema { ref missing, .. } if missing == &["trip_trip_id"]));
}

#[test]
fn schema_error_wins_over_value_errors_under_abort() {
    let mut stop_table = Table::new(["hub", "trip_trip_ref_number", "visit_sequence"]);
    stop_table
        .push_row(vec![Value::Null, Value::from("R1"), Value::Int(1)])
        .unwrap();
    let config = AttributionConfig::two_key().with_policy(ValuePolicy::Abort);

    let err = attribute_risk(&stop_table, &Table::new(["Hub"]), &config).unwrap_err();
    assert!(matches!(err, AttributionError::Schema { .. }), "{err}");
}

#[test]
fn custom_column_names_are_honoured() {
    let keys = KeySpec::new(vec![
        KeyColumn::new("depot", "DEPOT"),
        KeyColumn::new("route", "Route No"),
    ])
    .unwrap();
    let mut config = AttributionConfig::with_keys(keys);
    config.visit_sequence = "stop_no".to_string();
    config.prediction_columns.defaults = "expected_failures".to_string();

    let mut stop_table = Table::new(["depot", "route", "stop_no"]);
    for seq in [10, 20, 30] {
        stop_table
            .push_row(vec![Value::from("D"), Value::Int(4), Value::Int(seq)])
            .unwrap();
    }
    let mut prediction_table =
        Table::new(["DEPOT", "Route No", "expected_failures", "avg DRR", "Max DRR", "Time"]);
    prediction_table
        .push_row(vec![
            Value::from("D"),
            Value::Int(4),
            Value::Int(2),
            Value::Float(0.1),
            Value::Float(0.3),
            Value::from("t"),
        ])
        .unwrap();

    let result = attribute_risk(&stop_table, &prediction_table, &config).unwrap();
    assert_eq!(column(&result.table, "stop_no"), ints(&[20, 30]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Value policy: skip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bad_prediction_rows_are_skipped_and_recorded() {
    init_logging();
    let prediction_table = prediction_table(vec![
        prediction_row(Value::from("H1"), "R1", Value::Int(-1)),
        prediction_row(Value::from("H1"), "R1", Value::from("two")),
        prediction_row(Value::from("H1"), "R1", Value::Float(1.5)),
        prediction_row(Value::Null, "R1", Value::Int(1)),
        prediction_row(Value::from("H1"), "R1", Value::Int(1)),
    ]);

    let result =
        attribute_risk(&good_stops(), &prediction_table, &AttributionConfig::two_key()).unwrap();

    assert_eq!(column(&result.table, "visit_sequence"), ints(&[3]));
    let rows: Vec<usize> = result.diagnostics.row_issues.iter().map(|i| i.row).collect();
    assert_eq!(rows, vec![0, 1, 2, 3]);
    assert_eq!(result.diagnostics.row_issues[0].column, "Defaults");
    assert_eq!(result.diagnostics.row_issues[3].column, "Hub");
    // The null-key row asked for defaults; the three bad-defaults rows did not count.
    assert_eq!(result.diagnostics.predictions_with_defaults, 2);
}

#[test]
fn bad_stop_rows_are_skipped_and_recorded() {
    let mut stop_table = Table::new(["hub", "trip_trip_ref_number", "visit_sequence"]);
    for row in [
        vec![Value::from("H1"), Value::from("R1"), Value::Int(1)],
        vec![Value::from("H1"), Value::from("R1"), Value::Int(0)],
        vec![Value::from("H1"), Value::from("  "), Value::Int(2)],
        vec![Value::from("H1"), Value::from("R1"), Value::Null],
        vec![Value::from("H1"), Value::from("R1"), Value::from("2")],
    ] {
        stop_table.push_row(row).unwrap();
    }

    let result = attribute_risk(
        &stop_table,
        &predictions(&[("H1", "R1", 5)]),
        &AttributionConfig::two_key(),
    )
    .unwrap();

    // Only rows 0 and 4 are usable; integer text is accepted as a sequence.
    let stop_rows: Vec<usize> = result.at_risk.iter().map(|s| s.stop_row).collect();
    assert_eq!(stop_rows, vec![0, 4]);
    assert_eq!(column(&result.table, "actual_defaults_marked"), ints(&[2, 2]));
    let issues: Vec<(usize, &str)> = result
        .diagnostics
        .row_issues
        .iter()
        .map(|i| (i.row, i.column.as_str()))
        .collect();
    assert_eq!(
        issues,
        vec![(1, "visit_sequence"), (2, "trip_trip_ref_number"), (3, "visit_sequence")]
    );
}

#[test]
fn integral_defaults_in_any_form_are_accepted() {
    let prediction_table = prediction_table(vec![
        prediction_row(Value::from("H1"), "R1", Value::Float(2.0)),
        prediction_row(Value::from("H1"), "R1", Value::from(" 1 ")),
    ]);
    let result =
        attribute_risk(&good_stops(), &prediction_table, &AttributionConfig::two_key()).unwrap();
    assert_eq!(column(&result.table, "visit_sequence"), ints(&[2, 3, 3]));
    assert!(result.diagnostics.row_issues.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Value policy: abort
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn abort_policy_fails_on_negative_defaults() {
    let prediction_table = prediction_table(vec![
        prediction_row(Value::from("H1"), "R1", Value::Int(1)),
        prediction_row(Value::from("H1"), "R1", Value::Int(-3)),
    ]);
    let config = AttributionConfig::two_key().with_policy(ValuePolicy::Abort);

    let err = attribute_risk(&good_stops(), &prediction_table, &config).unwrap_err();
    match err {
        AttributionError::Value { table, row, column, .. } => {
            assert_eq!(table, "Predictions");
            assert_eq!(row, 1);
            assert_eq!(column, "Defaults");
        }
        other => panic!("expected value error, got {other}"),
    }
}

#[test]
fn abort_policy_fails_on_null_stop_key() {
    let mut stop_table = Table::new(["hub", "trip_trip_ref_number", "visit_sequence"]);
    stop_table
        .push_row(vec![Value::Null, Value::from("R1"), Value::Int(1)])
        .unwrap();
    let config = AttributionConfig::two_key().with_policy(ValuePolicy::Abort);

    let err = attribute_risk(&stop_table, &predictions(&[("H1", "R1", 1)]), &config).unwrap_err();
    assert!(
        matches!(err, AttributionError::Value { ref table, row: 0, ref column, .. }
            if table == "Stops" && column == "hub"),
        "{err}"
    );
}

#[test]
fn abort_policy_ignores_zero_default_rows() {
    // A zero-default row never needs its key, so a null key there is harmless.
    let prediction_table = prediction_table(vec![
        prediction_row(Value::Null, "R1", Value::Int(0)),
        prediction_row(Value::from("H1"), "R1", Value::Int(1)),
    ]);
    let config = AttributionConfig::two_key().with_policy(ValuePolicy::Abort);

    let result = attribute_risk(&good_stops(), &prediction_table, &config).unwrap();
    assert_eq!(result.table.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Shipped configuration files
// ─────────────────────────────────────────────────────────────────────────────

fn shipped_config(name: &str) -> AttributionConfig {
    let path = format!("{}/../data/config/{name}", env!("CARGO_MANIFEST_DIR"));
    AttributionConfig::load(&path).expect("shipped config loads")
}

#[test]
fn shipped_two_key_config_matches_preset() {
    assert_eq!(shipped_config("two_key.json"), AttributionConfig::two_key());
}

#[test]
fn shipped_strict_config_aborts_on_bad_rows() {
    let config = shipped_config("three_key_strict.json");
    assert_eq!(config.keys.arity(), 3);
    assert_eq!(config.value_policy, ValuePolicy::Abort);
    assert_eq!(
        AttributionConfig::three_key().with_policy(ValuePolicy::Abort),
        config
    );
}

#[test]
fn missing_config_file_names_the_path() {
    let err = AttributionConfig::load("/nonexistent/atrisk.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/atrisk.json"));
}
