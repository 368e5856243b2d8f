//! A JSON workbook: several named sheets in one file, the stand-in for a
//! two-sheet spreadsheet (`Nodes` + `Predictions`).
//!
//! ```json
//! {"sheets": {"Nodes": {"columns": ["hub", ...], "rows": [["HUB001", ...]]}}}
//! ```

use crate::{
    error::{AttributionError, AttributionResult},
    table::Table,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: BTreeMap<String, Table>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, table: Table) -> Self {
        self.sheets.insert(name.to_string(), table);
        self
    }

    pub fn sheet(&self, name: &str) -> AttributionResult<&Table> {
        self.sheets
            .get(name)
            .ok_or_else(|| AttributionError::SheetNotFound {
                name: name.to_string(),
            })
    }

    pub fn from_json(content: &str) -> AttributionResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> AttributionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> AttributionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> AttributionResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn sheets_survive_json() {
        let mut nodes = Table::new(["hub", "visit_sequence"]);
        nodes.push_row(vec![Value::from("H1"), Value::Int(1)]).unwrap();
        let book = Workbook::new().with_sheet("Nodes", nodes.clone());

        let back = Workbook::from_json(&book.to_json().unwrap()).unwrap();
        assert_eq!(back.sheet("Nodes").unwrap(), &nodes);
    }

    #[test]
    fn missing_sheet_is_named_in_error() {
        let err = Workbook::new().sheet("Predictions").unwrap_err();
        assert!(err.to_string().contains("Predictions"));
    }

    #[test]
    fn ragged_sheet_is_rejected() {
        let json = r#"{"sheets": {"Nodes": {"columns": ["a", "b"], "rows": [[1]]}}}"#;
        assert!(Workbook::from_json(json).is_err());
    }
}
