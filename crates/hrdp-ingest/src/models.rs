//! Typed rows for the fixed ingestion schema
//!
//! Replaces open-ended per-row dictionaries with explicit records, one
//! per table, so coercion rules are exhaustively checked against the
//! table descriptors at compile time. A normalized row always carries
//! exactly its table's column set: no extra keys, no missing ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::TableName;

/// One store-ready employees row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRow {
    pub id: i64,
    pub name: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub department_id: i64,
    pub job_id: i64,
}

/// One store-ready departments row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRow {
    pub id: i64,
    pub department: Option<String>,
}

/// One store-ready jobs row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRow {
    pub id: i64,
    pub job: Option<String>,
}

/// A whole batch of normalized rows, tagged once by target table
///
/// Tagging the batch rather than each row keeps the writer dispatch
/// exhaustive and avoids re-checking the table per row.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedBatch {
    Employees(Vec<EmployeeRow>),
    Departments(Vec<DepartmentRow>),
    Jobs(Vec<JobRow>),
}

impl NormalizedBatch {
    /// The table this batch targets
    pub fn table(&self) -> TableName {
        match self {
            NormalizedBatch::Employees(_) => TableName::Employees,
            NormalizedBatch::Departments(_) => TableName::Departments,
            NormalizedBatch::Jobs(_) => TableName::Jobs,
        }
    }

    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        match self {
            NormalizedBatch::Employees(rows) => rows.len(),
            NormalizedBatch::Departments(rows) => rows.len(),
            NormalizedBatch::Jobs(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_reports_its_table() {
        let batch = NormalizedBatch::Jobs(vec![JobRow { id: 1, job: Some("Analyst".into()) }]);
        assert_eq!(batch.table(), TableName::Jobs);
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let batch = NormalizedBatch::Departments(Vec::new());
        assert_eq!(batch.len(), 0);
        assert!(batch.is_empty());
    }
}
