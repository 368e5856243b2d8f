use crate::error::{AttributionError, AttributionResult};
use serde::{Deserialize, Serialize};

/// One join-key role, named on both sides of the join. Prediction exports
/// spell some keys differently (`Hub` vs `hub`), so both names are explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumn {
    pub stop: String,
    pub prediction: String,
}

impl KeyColumn {
    pub fn new(stop: &str, prediction: &str) -> Self {
        Self {
            stop: stop.to_string(),
            prediction: prediction.to_string(),
        }
    }

    /// Same column name on both sides.
    pub fn same(name: &str) -> Self {
        Self::new(name, name)
    }
}

/// Ordered trip-identity columns: (hub, trip_ref) or (hub, trip_ref, trip_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeyColumn>", into = "Vec<KeyColumn>")]
pub struct KeySpec {
    columns: Vec<KeyColumn>,
}

impl KeySpec {
    pub const MIN_ARITY: usize = 2;
    pub const MAX_ARITY: usize = 3;

    pub fn new(columns: Vec<KeyColumn>) -> AttributionResult<Self> {
        if !(Self::MIN_ARITY..=Self::MAX_ARITY).contains(&columns.len()) {
            return Err(AttributionError::Config(format!(
                "trip key needs {} or {} columns, got {}",
                Self::MIN_ARITY,
                Self::MAX_ARITY,
                columns.len()
            )));
        }
        for (i, column) in columns.iter().enumerate() {
            if column.stop.is_empty() || column.prediction.is_empty() {
                return Err(AttributionError::Config(format!(
                    "key column {i} has an empty name"
                )));
            }
            if columns[..i].iter().any(|c| c.stop == column.stop) {
                return Err(AttributionError::Config(format!(
                    "key column '{}' listed twice",
                    column.stop
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[KeyColumn] {
        &self.columns
    }

    pub fn stop_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.stop.as_str())
    }

    pub fn prediction_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.prediction.as_str())
    }
}

impl TryFrom<Vec<KeyColumn>> for KeySpec {
    type Error = AttributionError;

    fn try_from(columns: Vec<KeyColumn>) -> AttributionResult<Self> {
        KeySpec::new(columns)
    }
}

impl From<KeySpec> for Vec<KeyColumn> {
    fn from(spec: KeySpec) -> Self {
        spec.columns
    }
}

/// Prediction-side metric column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionColumns {
    pub defaults: String,
    pub avg_drr: String,
    pub max_drr: String,
    pub time: String,
}

impl Default for PredictionColumns {
    fn default() -> Self {
        Self {
            defaults: "Defaults".to_string(),
            avg_drr: "avg DRR".to_string(),
            max_drr: "Max DRR".to_string(),
            time: "Time".to_string(),
        }
    }
}

/// What to do with a row whose values cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePolicy {
    /// Exclude the row, record a `RowIssue`, keep going.
    #[default]
    Skip,
    /// Fail the whole run on the first bad row.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetNames {
    pub stops: String,
    pub predictions: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            stops: "Nodes".to_string(),
            predictions: "Predictions".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionConfig {
    pub keys: KeySpec,
    #[serde(default = "default_visit_sequence")]
    pub visit_sequence: String,
    #[serde(default)]
    pub prediction_columns: PredictionColumns,
    #[serde(default)]
    pub value_policy: ValuePolicy,
    #[serde(default)]
    pub sheets: SheetNames,
}

fn default_visit_sequence() -> String {
    "visit_sequence".to_string()
}

impl AttributionConfig {
    pub fn with_keys(keys: KeySpec) -> Self {
        Self {
            keys,
            visit_sequence: default_visit_sequence(),
            prediction_columns: PredictionColumns::default(),
            value_policy: ValuePolicy::default(),
            sheets: SheetNames::default(),
        }
    }

    /// Join on hub and trip reference number.
    pub fn two_key() -> Self {
        Self::with_keys(KeySpec {
            columns: vec![
                KeyColumn::new("hub", "Hub"),
                KeyColumn::same("trip_trip_ref_number"),
            ],
        })
    }

    /// Join on hub, trip reference number and trip id.
    pub fn three_key() -> Self {
        Self::with_keys(KeySpec {
            columns: vec![
                KeyColumn::new("hub", "Hub"),
                KeyColumn::same("trip_trip_ref_number"),
                KeyColumn::same("trip_trip_id"),
            ],
        })
    }

    pub fn with_policy(mut self, policy: ValuePolicy) -> Self {
        self.value_policy = policy;
        self
    }

    /// Load from a JSON file. Omitted sections fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AttributionConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Columns the Stops table must carry.
    pub fn required_stop_columns(&self) -> Vec<&str> {
        self.keys
            .stop_names()
            .chain(std::iter::once(self.visit_sequence.as_str()))
            .collect()
    }

    /// Columns the Predictions table must carry.
    pub fn required_prediction_columns(&self) -> Vec<&str> {
        let p = &self.prediction_columns;
        self.keys
            .prediction_names()
            .chain([
                p.defaults.as_str(),
                p.avg_drr.as_str(),
                p.max_drr.as_str(),
                p.time.as_str(),
            ])
            .collect()
    }
}
