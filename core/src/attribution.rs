//! The risk-attribution engine.
//!
//! For every trip predicted to have defaults, mark the last N stops by
//! visit sequence, where N is the predicted default count capped at the
//! number of distinct sequences in the trip.
//!
//! RULES:
//!   - Pure function of (stops, predictions, config). No ambient state.
//!   - Key arity is configuration. Two- and three-key joins share one path.
//!   - Selection is over distinct sequence values, not rows: stops sharing
//!     a selected sequence are all marked.
//!   - Output order: prediction order, then stop row order within a trip.
//!   - Stop columns pass through unchanged; the five prediction columns
//!     are appended after them.

use crate::{
    config::AttributionConfig,
    diagnostics::{Diagnostics, EmptyReason, IssueLog, Outcome},
    error::{AttributionError, AttributionResult},
    model::{read_predictions, read_stops, resolve_columns, AtRiskStop, Stop, TripKey},
    table::{Table, Value},
    types::{VisitSequence, PREDICTIONS_TABLE, PREDICTION_COLUMNS, STOPS_TABLE},
};
use std::collections::{BTreeSet, HashMap};

/// Result of one attribution run.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    /// Stop columns followed by the prediction columns, one row per marked stop.
    pub table: Table,
    pub at_risk: Vec<AtRiskStop>,
    pub diagnostics: Diagnostics,
    pub outcome: Outcome,
}

impl Attribution {
    /// Finalized output column order.
    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    pub fn is_empty(&self) -> bool {
        self.at_risk.is_empty()
    }
}

/// The sequences chosen for one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailSelection {
    /// Ascending.
    pub sequences: Vec<VisitSequence>,
    /// `min(defaults, distinct sequence count)`.
    pub marked: u64,
}

impl TailSelection {
    pub fn contains(&self, sequence: VisitSequence) -> bool {
        self.sequences.binary_search(&sequence).is_ok()
    }
}

/// Pick the `defaults` largest distinct sequences, or all of them if fewer.
pub fn select_tail(
    sequences: impl IntoIterator<Item = VisitSequence>,
    defaults: u64,
) -> TailSelection {
    let distinct: BTreeSet<VisitSequence> = sequences.into_iter().collect();
    let available = distinct.len() as u64;
    let marked = defaults.min(available);
    let skip = (available - marked) as usize;
    TailSelection {
        sequences: distinct.into_iter().skip(skip).collect(),
        marked,
    }
}

/// Output header: every Stop column in order, then the prediction columns.
pub fn output_columns(stops: &Table) -> AttributionResult<Vec<String>> {
    if let Some(clash) = PREDICTION_COLUMNS
        .iter()
        .find(|name| stops.column_index(name).is_some())
    {
        return Err(AttributionError::Config(format!(
            "{STOPS_TABLE} already has a column named '{clash}'"
        )));
    }
    Ok(stops
        .columns()
        .iter()
        .cloned()
        .chain(PREDICTION_COLUMNS.iter().map(|c| c.to_string()))
        .collect())
}

/// Run the attribution.
///
/// Fails on missing columns, on a name clash with the appended columns, and,
/// under `ValuePolicy::Abort`, on the first unusable row. An empty result is
/// reported through `Outcome`, not as an error.
pub fn attribute_risk(
    stops: &Table,
    predictions: &Table,
    config: &AttributionConfig,
) -> AttributionResult<Attribution> {
    // Schema problems on either side are reported before any row is read.
    resolve_columns(stops, STOPS_TABLE, &config.required_stop_columns())?;
    resolve_columns(predictions, PREDICTIONS_TABLE, &config.required_prediction_columns())?;
    let columns = output_columns(stops)?;

    let mut issues = IssueLog::new(config.value_policy);
    let parsed_stops = read_stops(stops, config, &mut issues)?;
    let prediction_set = read_predictions(predictions, config, &mut issues)?;
    log::info!(
        "Loaded {} stops and {} predictions ({}-key join)",
        stops.len(),
        predictions.len(),
        config.keys.arity()
    );
    log::info!(
        "Found {} trips with predicted defaults",
        prediction_set.with_defaults
    );

    let trips = index_trips(&parsed_stops);
    let mut diagnostics = Diagnostics {
        stop_rows: stops.len(),
        prediction_rows: predictions.len(),
        predictions_with_defaults: prediction_set.with_defaults,
        ..Diagnostics::default()
    };
    let mut at_risk = Vec::new();

    for prediction in &prediction_set.records {
        let Some(trip_stops) = trips.get(&prediction.key) else {
            log::warn!("No matching stops found for {}", prediction.key);
            diagnostics.unmatched_trips.push(prediction.key.clone());
            continue;
        };
        diagnostics.matched_trips += 1;

        let selection = select_tail(
            trip_stops.iter().map(|s| s.visit_sequence),
            prediction.defaults,
        );
        log::debug!(
            "{}: {} stops, predicted {}, marking sequences {:?}",
            prediction.key,
            trip_stops.len(),
            prediction.defaults,
            selection.sequences
        );

        at_risk.extend(
            trip_stops
                .iter()
                .filter(|stop| selection.contains(stop.visit_sequence))
                .map(|stop| AtRiskStop {
                    stop_row: stop.row,
                    key: stop.key.clone(),
                    visit_sequence: stop.visit_sequence,
                    predicted_defaults: prediction.defaults,
                    actual_defaults_marked: selection.marked,
                    avg_drr: prediction.avg_drr.clone(),
                    max_drr: prediction.max_drr.clone(),
                    prediction_time: prediction.time.clone(),
                }),
        );
    }

    log::info!(
        "Matched {} trips out of {} trips with defaults",
        diagnostics.matched_trips,
        diagnostics.predictions_with_defaults
    );

    diagnostics.stops_marked = at_risk.len();
    diagnostics.row_issues = issues.into_issues();

    let outcome = if !at_risk.is_empty() {
        Outcome::Marked
    } else if diagnostics.predictions_with_defaults == 0 {
        Outcome::NoAtRiskStops(EmptyReason::NoDefaultsPredicted)
    } else if diagnostics.matched_trips == 0 {
        Outcome::NoAtRiskStops(EmptyReason::NoTripsMatched)
    } else {
        // Unreachable while matched trips have a stop and defaults >= 1; kept
        // so every empty-result cause has a name.
        Outcome::NoAtRiskStops(EmptyReason::NothingSelected)
    };
    if let Outcome::NoAtRiskStops(reason) = outcome {
        log::warn!("No at-risk stops could be identified: {}", reason.describe());
    }

    let table = materialize(stops, columns, &at_risk)?;
    Ok(Attribution {
        table,
        at_risk,
        diagnostics,
        outcome,
    })
}

/// Group parsed stops by trip, keeping source row order inside each group.
fn index_trips(stops: &[Stop]) -> HashMap<&TripKey, Vec<&Stop>> {
    let mut trips: HashMap<&TripKey, Vec<&Stop>> = HashMap::new();
    for stop in stops {
        trips.entry(&stop.key).or_default().push(stop);
    }
    trips
}

fn materialize(
    stops: &Table,
    columns: Vec<String>,
    at_risk: &[AtRiskStop],
) -> AttributionResult<Table> {
    let mut table = Table::new(columns);
    for marked in at_risk {
        let mut row: Vec<Value> = stops.rows()[marked.stop_row].clone();
        row.extend([
            Value::from(marked.predicted_defaults),
            Value::from(marked.actual_defaults_marked),
            marked.avg_drr.clone(),
            marked.max_drr.clone(),
            marked.prediction_time.clone(),
        ]);
        table.push_row(row)?;
    }
    Ok(table)
}
