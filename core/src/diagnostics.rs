//! Run diagnostics: counts, unmatched trips, skipped rows, and the
//! key-overlap report used to explain an empty result.
//!
//! Diagnostics are observational. Nothing here feeds back into selection.

use crate::{
    config::{AttributionConfig, ValuePolicy},
    error::{AttributionError, AttributionResult},
    model::{resolve_columns, TripKey},
    table::{KeyPart, Table},
    types::{PREDICTIONS_TABLE, STOPS_TABLE},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A row excluded from attribution because one of its values was unusable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub table: String,
    pub row: usize,
    pub column: String,
    pub reason: String,
}

impl RowIssue {
    pub fn new(table: &str, row: usize, column: &str, reason: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<RowIssue> for AttributionError {
    fn from(issue: RowIssue) -> Self {
        AttributionError::Value {
            table: issue.table,
            row: issue.row,
            column: issue.column,
            reason: issue.reason,
        }
    }
}

/// Collects row issues under a `ValuePolicy`.
#[derive(Debug, Default)]
pub struct IssueLog {
    policy: ValuePolicy,
    issues: Vec<RowIssue>,
}

impl IssueLog {
    pub fn new(policy: ValuePolicy) -> Self {
        Self {
            policy,
            issues: Vec::new(),
        }
    }

    /// Record an issue. Under `Abort` the issue becomes the run's error.
    pub fn record(&mut self, issue: RowIssue) -> AttributionResult<()> {
        match self.policy {
            ValuePolicy::Abort => Err(issue.into()),
            ValuePolicy::Skip => {
                log::warn!(
                    "Skipping {} row {}: {} ({})",
                    issue.table,
                    issue.row,
                    issue.reason,
                    issue.column
                );
                self.issues.push(issue);
                Ok(())
            }
        }
    }

    pub fn into_issues(self) -> Vec<RowIssue> {
        self.issues
    }
}

/// Why an attribution produced no rows. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// No prediction row had `defaults > 0`.
    NoDefaultsPredicted,
    /// Predictions had defaults but none matched a stop.
    NoTripsMatched,
    /// Trips matched but nothing was selected. Not produced by the current
    /// selection rule, which always marks at least one stop per matched trip.
    NothingSelected,
}

impl EmptyReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoDefaultsPredicted => "no defaults predicted",
            Self::NoTripsMatched => "no prediction matched any stop",
            Self::NothingSelected => "matched trips selected no stops",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Marked,
    NoAtRiskStops(EmptyReason),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub stop_rows: usize,
    pub prediction_rows: usize,
    pub predictions_with_defaults: usize,
    pub matched_trips: usize,
    /// Keys of predictions with defaults that matched no stop, in encounter order.
    pub unmatched_trips: Vec<TripKey>,
    pub stops_marked: usize,
    pub row_issues: Vec<RowIssue>,
}

impl Diagnostics {
    pub fn unmatched_count(&self) -> usize {
        self.unmatched_trips.len()
    }
}

/// Distinct values of one key role on each side of the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOverlap {
    pub stop_column: String,
    pub prediction_column: String,
    pub stop_distinct: usize,
    pub prediction_distinct: usize,
    pub common: Vec<KeyPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOverlap {
    pub columns: Vec<ColumnOverlap>,
}

/// Per key role, compare the value sets of both tables. Useful when a run
/// matches nothing: a hub spelled differently shows up as zero common values.
pub fn overlap(
    stops: &Table,
    predictions: &Table,
    config: &AttributionConfig,
) -> AttributionResult<KeyOverlap> {
    let stop_names: Vec<&str> = config.keys.stop_names().collect();
    let prediction_names: Vec<&str> = config.keys.prediction_names().collect();
    let stop_idx = resolve_columns(stops, STOPS_TABLE, &stop_names)?;
    let prediction_idx = resolve_columns(predictions, PREDICTIONS_TABLE, &prediction_names)?;

    let columns = config
        .keys
        .columns()
        .iter()
        .zip(stop_idx.into_iter().zip(prediction_idx))
        .map(|(key, (s, p))| {
            let stop_values = distinct(stops, s);
            let prediction_values = distinct(predictions, p);
            ColumnOverlap {
                stop_column: key.stop.clone(),
                prediction_column: key.prediction.clone(),
                stop_distinct: stop_values.len(),
                prediction_distinct: prediction_values.len(),
                common: stop_values.intersection(&prediction_values).cloned().collect(),
            }
        })
        .collect();
    Ok(KeyOverlap { columns })
}

fn distinct(table: &Table, column: usize) -> BTreeSet<KeyPart> {
    table
        .rows()
        .iter()
        .filter_map(|row| row[column].as_key_part())
        .collect()
}
