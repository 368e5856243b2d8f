use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Missing required columns in {table}: {}", .missing.join(", "))]
    Schema { table: String, missing: Vec<String> },

    #[error("Invalid value in {table} row {row}, column '{column}': {reason}")]
    Value {
        table: String,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Row {row} has {actual} cells but the table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("CSV error at line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("Sheet '{name}' not found in workbook")]
    SheetNotFound { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AttributionResult<T> = Result<T, AttributionError>;
