//! Typed records lifted out of the generic input tables.
//!
//! The algorithm only needs keys, sequences and prediction metrics, so the
//! typed records carry those plus the source row index. Every other Stop
//! column stays in the table and is copied through untouched at output time.

use crate::{
    config::AttributionConfig,
    diagnostics::{IssueLog, RowIssue},
    error::{AttributionError, AttributionResult},
    table::{KeyPart, Table, Value},
    types::{RowIndex, VisitSequence, PREDICTIONS_TABLE, STOPS_TABLE},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trip identity. `trip_id` is absent when joining on two keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripKey {
    pub hub: KeyPart,
    pub trip_ref: KeyPart,
    pub trip_id: Option<KeyPart>,
}

impl TripKey {
    /// Build from positional parts: 2 for (hub, trip_ref), 3 adds trip_id.
    pub fn from_parts(parts: Vec<KeyPart>) -> Option<Self> {
        let mut parts = parts.into_iter();
        let hub = parts.next()?;
        let trip_ref = parts.next()?;
        let trip_id = parts.next();
        if parts.next().is_some() {
            return None;
        }
        Some(Self { hub, trip_ref, trip_id })
    }

    pub fn two(hub: impl Into<String>, trip_ref: impl Into<String>) -> Self {
        Self {
            hub: KeyPart::Text(hub.into()),
            trip_ref: KeyPart::Text(trip_ref.into()),
            trip_id: None,
        }
    }

    pub fn three(
        hub: impl Into<String>,
        trip_ref: impl Into<String>,
        trip_id: impl Into<String>,
    ) -> Self {
        Self {
            trip_id: Some(KeyPart::Text(trip_id.into())),
            ..Self::two(hub, trip_ref)
        }
    }
}

impl fmt::Display for TripKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hub: {}, Trip Ref: {}", self.hub, self.trip_ref)?;
        if let Some(id) = &self.trip_id {
            write!(f, ", Trip ID: {id}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub row: RowIndex,
    pub key: TripKey,
    pub visit_sequence: VisitSequence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub row: RowIndex,
    pub key: TripKey,
    pub defaults: u64,
    pub avg_drr: Value,
    pub max_drr: Value,
    pub time: Value,
}

/// A selected stop plus the prediction that selected it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskStop {
    pub stop_row: RowIndex,
    pub key: TripKey,
    pub visit_sequence: VisitSequence,
    pub predicted_defaults: u64,
    pub actual_defaults_marked: u64,
    pub avg_drr: Value,
    pub max_drr: Value,
    pub prediction_time: Value,
}

/// Resolve column names to positions, failing with the full list of absentees.
pub(crate) fn resolve_columns(
    table: &Table,
    table_name: &str,
    names: &[&str],
) -> AttributionResult<Vec<usize>> {
    let missing = table.missing_columns(names.iter().copied());
    if !missing.is_empty() {
        return Err(AttributionError::Schema {
            table: table_name.to_string(),
            missing,
        });
    }
    Ok(names.iter().filter_map(|n| table.column_index(n)).collect())
}

struct KeyReader<'a> {
    table_name: &'static str,
    names: Vec<&'a str>,
    indices: Vec<usize>,
}

impl KeyReader<'_> {
    fn read(&self, row: RowIndex, cells: &[Value]) -> Result<TripKey, RowIssue> {
        let mut parts = Vec::with_capacity(self.indices.len());
        for (&idx, &name) in self.indices.iter().zip(&self.names) {
            match cells[idx].as_key_part() {
                Some(part) => parts.push(part),
                None => {
                    return Err(RowIssue::new(
                        self.table_name,
                        row,
                        name,
                        format!("join key is null or unusable ({:?})", cells[idx]),
                    ))
                }
            }
        }
        TripKey::from_parts(parts).ok_or_else(|| {
            RowIssue::new(self.table_name, row, self.names[0], "wrong number of key parts")
        })
    }
}

/// Parse every Stop row. Unusable rows go through `issues`.
pub fn read_stops(
    table: &Table,
    config: &AttributionConfig,
    issues: &mut IssueLog,
) -> AttributionResult<Vec<Stop>> {
    let required = config.required_stop_columns();
    let indices = resolve_columns(table, STOPS_TABLE, &required)?;
    let arity = config.keys.arity();
    let keys = KeyReader {
        table_name: STOPS_TABLE,
        names: required[..arity].to_vec(),
        indices: indices[..arity].to_vec(),
    };
    let seq_idx = indices[arity];

    let mut stops = Vec::with_capacity(table.len());
    for (row, cells) in table.rows().iter().enumerate() {
        let key = match keys.read(row, cells) {
            Ok(key) => key,
            Err(issue) => {
                issues.record(issue)?;
                continue;
            }
        };
        match cells[seq_idx].as_integer() {
            Some(visit_sequence) if visit_sequence > 0 => stops.push(Stop {
                row,
                key,
                visit_sequence,
            }),
            _ => issues.record(RowIssue::new(
                STOPS_TABLE,
                row,
                &config.visit_sequence,
                format!("visit_sequence must be a positive integer, got {:?}", cells[seq_idx]),
            ))?,
        }
    }
    Ok(stops)
}

/// Prediction rows that survived validation, plus how many rows asked for
/// at least one default before key validation.
#[derive(Debug, Clone, Default)]
pub struct PredictionSet {
    pub records: Vec<PredictionRecord>,
    pub with_defaults: usize,
}

/// Parse Prediction rows, keeping only those with `defaults > 0`.
pub fn read_predictions(
    table: &Table,
    config: &AttributionConfig,
    issues: &mut IssueLog,
) -> AttributionResult<PredictionSet> {
    let required = config.required_prediction_columns();
    let indices = resolve_columns(table, PREDICTIONS_TABLE, &required)?;
    let arity = config.keys.arity();
    let keys = KeyReader {
        table_name: PREDICTIONS_TABLE,
        names: required[..arity].to_vec(),
        indices: indices[..arity].to_vec(),
    };
    let [defaults_idx, avg_idx, max_idx, time_idx] = [
        indices[arity],
        indices[arity + 1],
        indices[arity + 2],
        indices[arity + 3],
    ];
    let defaults_name = &config.prediction_columns.defaults;

    let mut set = PredictionSet::default();
    for (row, cells) in table.rows().iter().enumerate() {
        let defaults = match cells[defaults_idx].as_integer() {
            Some(n) if n < 0 => {
                issues.record(RowIssue::new(
                    PREDICTIONS_TABLE,
                    row,
                    defaults_name,
                    format!("defaults must be non-negative, got {n}"),
                ))?;
                continue;
            }
            Some(0) => continue,
            Some(n) => n as u64,
            None => {
                issues.record(RowIssue::new(
                    PREDICTIONS_TABLE,
                    row,
                    defaults_name,
                    format!("defaults must be an integer, got {:?}", cells[defaults_idx]),
                ))?;
                continue;
            }
        };
        set.with_defaults += 1;

        let key = match keys.read(row, cells) {
            Ok(key) => key,
            Err(issue) => {
                issues.record(issue)?;
                continue;
            }
        };
        set.records.push(PredictionRecord {
            row,
            key,
            defaults,
            avg_drr: cells[avg_idx].clone(),
            max_drr: cells[max_idx].clone(),
            time: cells[time_idx].clone(),
        });
    }
    Ok(set)
}
