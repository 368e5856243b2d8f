//! Shared primitive types used across the engine.

/// Zero-based index of a data row within its source table.
pub type RowIndex = usize;

/// A visit position within a trip. Positive; gaps and repeats allowed.
pub type VisitSequence = i64;

/// Names of the two input tables, used in errors and row issues.
pub const STOPS_TABLE: &str = "Stops";
pub const PREDICTIONS_TABLE: &str = "Predictions";

/// Columns appended to every at-risk stop, in output order.
pub const PREDICTED_DEFAULTS: &str = "predicted_defaults";
pub const ACTUAL_DEFAULTS_MARKED: &str = "actual_defaults_marked";
pub const AVG_DRR: &str = "avg_drr";
pub const MAX_DRR: &str = "max_drr";
pub const PREDICTION_TIME: &str = "prediction_time";

pub const PREDICTION_COLUMNS: [&str; 5] = [
    PREDICTED_DEFAULTS,
    ACTUAL_DEFAULTS_MARKED,
    AVG_DRR,
    MAX_DRR,
    PREDICTION_TIME,
];
