//! Import outcomes and how they are presented to API clients.

use rocket::http::Status;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A row that validated and was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportRecord {
    /// 1-based data row number (header and blank lines excluded).
    pub row: usize,
}

/// A row that failed validation, with one message per failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportErrorRecord {
    pub row: usize,
    pub errors: Vec<String>,
}

/// Per-row result of one import. Both lists are in ascending row order and
/// every decoded row appears in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success_records: Vec<ImportRecord>,
    pub error_records: Vec<ImportErrorRecord>,
}

impl ImportOutcome {
    pub fn total_rows(&self) -> usize {
        self.success_records.len() + self.error_records.len()
    }
}

/// Request-level verdict derived from an [`ImportOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportReport {
    /// The upload contained no data rows.
    Empty,
    /// Every row failed validation; nothing was persisted.
    AllRejected(ImportOutcome),
    /// Some rows were persisted and some were rejected.
    Partial(ImportOutcome),
    /// Every row was persisted.
    Complete(ImportOutcome),
}

impl ImportReport {
    pub fn classify(outcome: ImportOutcome) -> Self {
        match (
            outcome.success_records.is_empty(),
            outcome.error_records.is_empty(),
        ) {
            (true, true) => ImportReport::Empty,
            (true, false) => ImportReport::AllRejected(outcome),
            (false, false) => ImportReport::Partial(outcome),
            (false, true) => ImportReport::Complete(outcome),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            ImportReport::Empty | ImportReport::AllRejected(_) => Status::BadRequest,
            ImportReport::Partial(_) | ImportReport::Complete(_) => Status::Created,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ImportReport::Empty => "No records found in the file",
            ImportReport::AllRejected(_) => "No records successfully imported",
            ImportReport::Partial(_) => "Some records failed to import",
            ImportReport::Complete(_) => "Hotels imported successfully",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(success: &[usize], errors: &[usize]) -> ImportOutcome {
        ImportOutcome {
            success_records: success.iter().map(|&row| ImportRecord { row }).collect(),
            error_records: errors
                .iter()
                .map(|&row| ImportErrorRecord {
                    row,
                    errors: vec!["name should not be empty".into()],
                })
                .collect(),
        }
    }

    #[test]
    fn classifies_each_shape() {
        let empty = ImportReport::classify(outcome(&[], &[]));
        assert_eq!(empty, ImportReport::Empty);
        assert_eq!(empty.status(), Status::BadRequest);
        assert_eq!(empty.message(), "No records found in the file");

        let rejected = ImportReport::classify(outcome(&[], &[1]));
        assert!(matches!(rejected, ImportReport::AllRejected(_)));
        assert_eq!(rejected.status(), Status::BadRequest);
        assert_eq!(rejected.message(), "No records successfully imported");

        let partial = ImportReport::classify(outcome(&[1], &[2]));
        assert!(matches!(partial, ImportReport::Partial(_)));
        assert_eq!(partial.status(), Status::Created);
        assert_eq!(partial.message(), "Some records failed to import");

        let complete = ImportReport::classify(outcome(&[1, 2], &[]));
        assert!(matches!(complete, ImportReport::Complete(_)));
        assert_eq!(complete.message(), "Hotels imported successfully");
    }

    #[test]
    fn serializes_with_camel_case_lists() {
        let json = serde_json::to_value(outcome(&[1], &[2])).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "successRecords": [{"row": 1}],
                "errorRecords": [{"row": 2, "errors": ["name should not be empty"]}],
            })
        );
    }
}
