//! Row normalizer
//!
//! Applies per-column coercion rules to raw rows, producing store-ready
//! typed rows. Rules are applied independently per row, with no
//! cross-row state. Any failure aborts the containing batch before
//! a write is attempted (there is no per-row skip mechanism).
//!
//! Per-column rules, in descriptor order:
//!
//! 1. Timestamp columns: missing/empty input is NULL; non-empty input is
//!    parsed permissively (RFC 3339 first, then a fixed list of common
//!    datetime and date-only formats); unparseable non-empty input fails.
//! 2. Nullable text columns: missing/empty input is preserved as NULL,
//!    never coerced to "".
//! 3. Foreign-key columns: missing/empty input defaults to the sentinel 0
//!    ("unassigned"); present input is coerced to an integer, truncating
//!    a fractional representation.
//! 4. Id columns: required integer with the same truncating coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::{DepartmentRow, EmployeeRow, JobRow, NormalizedBatch};
use crate::reader::RawRow;
use crate::schema::TableName;

/// Datetime formats tried in order after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only formats, normalized to midnight UTC
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Row-level coercion failure; escalates to batch-fatal
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid timestamp in column '{column}' at row {row}: '{value}'")]
    InvalidTimestamp {
        column: &'static str,
        row: u64,
        value: String,
    },

    #[error("Invalid integer in column '{column}' at row {row}: '{value}'")]
    InvalidInteger {
        column: &'static str,
        row: u64,
        value: String,
    },
}

/// Normalize one batch of raw rows for `table`
pub fn normalize_batch(
    table: TableName,
    rows: &[RawRow],
) -> Result<NormalizedBatch, NormalizeError> {
    match table {
        TableName::Employees => rows
            .iter()
            .map(normalize_employee)
            .collect::<Result<Vec<_>, _>>()
            .map(NormalizedBatch::Employees),
        TableName::Departments => rows
            .iter()
            .map(normalize_department)
            .collect::<Result<Vec<_>, _>>()
            .map(NormalizedBatch::Departments),
        TableName::Jobs => rows
            .iter()
            .map(normalize_job)
            .collect::<Result<Vec<_>, _>>()
            .map(NormalizedBatch::Jobs),
    }
}

/// Field positions follow the employees descriptor:
/// id, name, datetime, department_id, job_id
fn normalize_employee(raw: &RawRow) -> Result<EmployeeRow, NormalizeError> {
    Ok(EmployeeRow {
        id: required_integer(raw, 0, "id")?,
        name: text(raw, 1),
        datetime: timestamp(raw, 2, "datetime")?,
        department_id: foreign_key(raw, 3, "department_id")?,
        job_id: foreign_key(raw, 4, "job_id")?,
    })
}

/// Field positions follow the departments descriptor: id, department
fn normalize_department(raw: &RawRow) -> Result<DepartmentRow, NormalizeError> {
    Ok(DepartmentRow {
        id: required_integer(raw, 0, "id")?,
        department: text(raw, 1),
    })
}

/// Field positions follow the jobs descriptor: id, job
fn normalize_job(raw: &RawRow) -> Result<JobRow, NormalizeError> {
    Ok(JobRow {
        id: required_integer(raw, 0, "id")?,
        job: text(raw, 1),
    })
}

/// Nullable text: empty/missing stays NULL, never ""
fn text(raw: &RawRow, index: usize) -> Option<String> {
    raw.field(index).map(str::to_string)
}

/// Required integer column
fn required_integer(
    raw: &RawRow,
    index: usize,
    column: &'static str,
) -> Result<i64, NormalizeError> {
    let value = raw.field(index).ok_or_else(|| NormalizeError::InvalidInteger {
        column,
        row: raw.row(),
        value: String::new(),
    })?;
    coerce_integer(value).ok_or_else(|| NormalizeError::InvalidInteger {
        column,
        row: raw.row(),
        value: value.to_string(),
    })
}

/// Foreign-key column: missing defaults to the sentinel 0
fn foreign_key(raw: &RawRow, index: usize, column: &'static str) -> Result<i64, NormalizeError> {
    match raw.field(index) {
        None => Ok(0),
        Some(value) => coerce_integer(value).ok_or_else(|| NormalizeError::InvalidInteger {
            column,
            row: raw.row(),
            value: value.to_string(),
        }),
    }
}

/// Timestamp column: missing is NULL, present input must parse
fn timestamp(
    raw: &RawRow,
    index: usize,
    column: &'static str,
) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    match raw.field(index) {
        None => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .ok_or_else(|| NormalizeError::InvalidTimestamp {
                column,
                row: raw.row(),
                value: value.to_string(),
            }),
    }
}

/// Integer coercion, truncating a fractional textual representation
/// toward zero ("7.0" -> 7, "-3.9" -> -3)
fn coerce_integer(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    let f = value.parse::<f64>().ok()?;
    if !f.is_finite() || f >= LIMIT || f < -LIMIT {
        return None;
    }
    Some(f.trunc() as i64)
}

/// Permissive timestamp parse: RFC 3339, then the fixed format lists.
/// Naive inputs are assumed UTC; offset inputs are converted.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}
