//! Sample workbook generator for demos and manual testing.
//!
//! Produces a `Nodes` sheet of trips with 5-14 stops each and a
//! `Predictions` sheet covering most trips, a minority with defaults.

use crate::{
    config::SheetNames,
    error::AttributionResult,
    io::workbook::Workbook,
    rng::{RngBank, SampleStream},
    table::{Table, Value},
};
use chrono::{Duration, NaiveDateTime};

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub hubs: usize,
    pub trip_refs_per_hub: usize,
    pub trip_ids_per_ref: usize,
    /// Stops per trip, half-open.
    pub min_stops: u64,
    pub max_stops: u64,
    /// Chance a trip gets a prediction row.
    pub prediction_rate: f64,
    /// Chance a predicted trip has defaults.
    pub default_rate: f64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            hubs: 3,
            trip_refs_per_hub: 5,
            trip_ids_per_ref: 2,
            min_stops: 5,
            max_stops: 15,
            prediction_rate: 0.8,
            default_rate: 0.3,
        }
    }
}

const NODE_COLUMNS: [&str; 9] = [
    "hub",
    "trip_trip_ref_number",
    "trip_trip_id",
    "visit_sequence",
    "customer_name",
    "order_id",
    "delivery_date",
    "slots_start_time",
    "slots_end_time",
];

const PREDICTION_COLUMNS: [&str; 7] = [
    "Hub",
    "trip_trip_ref_number",
    "trip_trip_id",
    "Defaults",
    "avg DRR",
    "Max DRR",
    "Time",
];

/// Generate a two-sheet workbook. Same seed, `SampleSpec` and timestamp give the
/// same workbook.
pub fn generate_sample(
    seed: u64,
    spec: &SampleSpec,
    generated_at: NaiveDateTime,
) -> AttributionResult<Workbook> {
    let bank = RngBank::new(seed);
    let mut stop_rng = bank.for_stream(SampleStream::Stops);
    let mut prediction_rng = bank.for_stream(SampleStream::Predictions);
    let time = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    let mut nodes = Table::new(NODE_COLUMNS);
    let mut predictions = Table::new(PREDICTION_COLUMNS);

    for hub in (1..=spec.hubs).map(|h| format!("HUB{h:03}")) {
        for trip_ref in (1..=spec.trip_refs_per_hub).map(|r| format!("TR{r:03}")) {
            for trip_id in (1..=spec.trip_ids_per_ref).map(|t| format!("TID{t:04}")) {
                let stop_count = stop_rng.range(spec.min_stops, spec.max_stops);
                for seq in 1..=stop_count {
                    let delivery = generated_at + Duration::days(stop_rng.range(1, 10) as i64);
                    let start = generated_at + Duration::hours(stop_rng.range(1, 24) as i64);
                    let end = generated_at + Duration::hours(stop_rng.range(1, 24) as i64);
                    let row = vec![
                        Value::from(hub.as_str()),
                        Value::from(trip_ref.as_str()),
                        Value::from(trip_id.as_str()),
                        Value::from(seq),
                        Value::from(format!("Customer_{}", stop_rng.range(1, 100))),
                        Value::from(format!("ORD{}", stop_rng.range(10_000, 100_000))),
                        Value::from(delivery.format("%Y-%m-%d").to_string()),
                        Value::from(start.format("%H:%M:%S").to_string()),
                        Value::from(end.format("%H:%M:%S").to_string()),
                    ];
                    nodes.push_row(row)?;
                }

                if !prediction_rng.chance(spec.prediction_rate) {
                    continue;
                }
                let defaults = if prediction_rng.chance(spec.default_rate) {
                    prediction_rng.range(1, stop_count.max(2))
                } else {
                    0
                };
                let row = vec![
                    Value::from(hub.as_str()),
                    Value::from(trip_ref.as_str()),
                    Value::from(trip_id.as_str()),
                    Value::from(defaults),
                    Value::from(prediction_rng.uniform(0.01, 0.2)),
                    Value::from(prediction_rng.uniform(0.05, 0.4)),
                    Value::from(time.as_str()),
                ];
                predictions.push_row(row)?;
            }
        }
    }

    log::info!(
        "Generated {} stop rows and {} prediction rows",
        nodes.len(),
        predictions.len()
    );
    let sheets = SheetNames::default();
    Ok(Workbook::new()
        .with_sheet(&sheets.stops, nodes)
        .with_sheet(&sheets.predictions, predictions))
}
