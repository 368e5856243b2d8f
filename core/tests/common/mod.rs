#![allow(dead_code)]

use atrisk_core::{Table, Value};

pub const STOP_COLUMNS_2: [&str; 4] = ["hub", "trip_trip_ref_number", "visit_sequence", "customer_name"];
pub const STOP_COLUMNS_3: [&str; 5] = [
    "hub",
    "trip_trip_ref_number",
    "trip_trip_id",
    "visit_sequence",
    "customer_name",
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Stops keyed on (hub, ref). Each row gets a unique customer name.
pub fn stops(rows: &[(&str, &str, i64)]) -> Table {
    let mut table = Table::new(STOP_COLUMNS_2);
    for (i, (hub, trip_ref, seq)) in rows.iter().enumerate() {
        table
            .push_row(vec![
                Value::from(*hub),
                Value::from(*trip_ref),
                Value::Int(*seq),
                Value::from(format!("customer-{i}")),
            ])
            .expect("stop row");
    }
    table
}

/// Stops keyed on (hub, ref, trip id).
pub fn stops3(rows: &[(&str, &str, &str, i64)]) -> Table {
    let mut table = Table::new(STOP_COLUMNS_3);
    for (i, (hub, trip_ref, trip_id, seq)) in rows.iter().enumerate() {
        table
            .push_row(vec![
                Value::from(*hub),
                Value::from(*trip_ref),
                Value::from(*trip_id),
                Value::Int(*seq),
                Value::from(format!("customer-{i}")),
            ])
            .expect("stop row");
    }
    table
}

/// Predictions keyed on (Hub, ref) with fixed metrics.
pub fn predictions(rows: &[(&str, &str, i64)]) -> Table {
    let mut table = Table::new(["Hub", "trip_trip_ref_number", "Defaults", "avg DRR", "Max DRR", "Time"]);
    for (hub, trip_ref, defaults) in rows {
        table
            .push_row(vec![
                Value::from(*hub),
                Value::from(*trip_ref),
                Value::Int(*defaults),
                Value::Float(0.12),
                Value::Float(0.34),
                Value::from("2024-03-01 08:00:00"),
            ])
            .expect("prediction row");
    }
    table
}

pub fn predictions3(rows: &[(&str, &str, &str, i64)]) -> Table {
    let mut table = Table::new([
        "Hub",
        "trip_trip_ref_number",
        "trip_trip_id",
        "Defaults",
        "avg DRR",
        "Max DRR",
        "Time",
    ]);
    for (hub, trip_ref, trip_id, defaults) in rows {
        table
            .push_row(vec![
                Value::from(*hub),
                Value::from(*trip_ref),
                Value::from(*trip_id),
                Value::Int(*defaults),
                Value::Float(0.05),
                Value::Float(0.25),
                Value::from("2024-03-01 09:30:00"),
            ])
            .expect("prediction row");
    }
    table
}

/// Values of one column across all rows.
pub fn column(table: &Table, name: &str) -> Vec<Value> {
    let idx = table.column_index(name).expect("column present");
    table.rows().iter().map(|r| r[idx].clone()).collect()
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}
