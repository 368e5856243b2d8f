//! Per-trip breakdown of an attribution result, for reporting only.

use crate::{
    config::KeySpec,
    error::{AttributionError, AttributionResult},
    model::resolve_columns,
    table::{KeyPart, Table, Value},
    types::{VisitSequence, ACTUAL_DEFAULTS_MARKED, PREDICTED_DEFAULTS},
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

const OUTPUT_TABLE: &str = "AtRiskStops";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    /// Key values in key-column order.
    pub key: Vec<Value>,
    pub stops_found: usize,
    pub sequences: Vec<VisitSequence>,
    pub predicted_defaults: Value,
    pub actual_defaults_marked: Value,
}

/// Group the at-risk table by trip key. Groups come out in first-appearance
/// order; the table itself is only read.
pub fn summarize(
    at_risk: &Table,
    keys: &KeySpec,
    visit_sequence: &str,
) -> AttributionResult<Vec<BreakdownRow>> {
    let mut names: Vec<&str> = keys.stop_names().collect();
    names.extend([visit_sequence, PREDICTED_DEFAULTS, ACTUAL_DEFAULTS_MARKED]);
    let indices = resolve_columns(at_risk, OUTPUT_TABLE, &names)?;
    let arity = keys.arity();
    let (key_idx, rest) = indices.split_at(arity);
    let (seq_idx, predicted_idx, marked_idx) = (rest[0], rest[1], rest[2]);

    let mut groups: Vec<(BreakdownRow, BTreeSet<VisitSequence>)> = Vec::new();
    let mut positions: HashMap<Vec<Option<KeyPart>>, usize> = HashMap::new();

    for (row_no, row) in at_risk.rows().iter().enumerate() {
        let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
        let sequence = row[seq_idx].as_integer().ok_or_else(|| AttributionError::Value {
            table: OUTPUT_TABLE.to_string(),
            row: row_no,
            column: visit_sequence.to_string(),
            reason: format!("not an integer: {:?}", row[seq_idx]),
        })?;

        // Same normalisation as the join: `Int(1)` and `Text("1")` are different trips.
        let group_key: Vec<Option<KeyPart>> = key.iter().map(Value::as_key_part).collect();
        let pos = *positions.entry(group_key).or_insert_with(|| {
            groups.push((
                BreakdownRow {
                    key,
                    stops_found: 0,
                    sequences: Vec::new(),
                    predicted_defaults: row[predicted_idx].clone(),
                    actual_defaults_marked: row[marked_idx].clone(),
                },
                BTreeSet::new(),
            ));
            groups.len() - 1
        });
        let (group, sequences) = &mut groups[pos];
        group.stops_found += 1;
        sequences.insert(sequence);
    }

    Ok(groups
        .into_iter()
        .map(|(mut row, sequences)| {
            row.sequences = sequences.into_iter().collect();
            row
        })
        .collect())
}

/// Plain-text breakdown table.
pub fn render_breakdown(keys: &KeySpec, rows: &[BreakdownRow]) -> String {
    let mut header: Vec<String> = keys.stop_names().map(str::to_string).collect();
    header.extend(
        ["Stops Found", "Sequences", "Defaults Predicted", "Defaults Marked"]
            .iter()
            .map(|s| s.to_string()),
    );

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.key.iter().map(Value::to_string).collect();
            let sequences: Vec<String> = row.sequences.iter().map(|s| s.to_string()).collect();
            cells.push(row.stops_found.to_string());
            cells.push(format!("[{}]", sequences.join(", ")));
            cells.push(row.predicted_defaults.to_string());
            cells.push(row.actual_defaults_marked.to_string());
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|c| {
            body.iter()
                .map(|r| r[c].len())
                .chain(std::iter::once(header[c].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format_line(&header);
    for cells in &body {
        out.push('\n');
        out.push_str(&format_line(cells));
    }
    out
}
