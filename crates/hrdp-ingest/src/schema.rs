//! Schema registry for the fixed set of ingestible tables
//!
//! Maps a table identifier to its ordered column list and per-column
//! coercion rules. The registry is static data resolved by pure lookup;
//! nothing here touches the store.
//!
//! Input files are headerless: fields are matched to columns *by
//! position*, in the declared order below. Column order drift between a
//! file and its descriptor corrupts data silently; the declared order is
//! a precondition of the whole pipeline, not something that is
//! auto-detected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a table identifier is not in the registry.
///
/// Request-level: no side effects have occurred when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown table '{0}'. Expected one of: employees, departments, jobs")]
pub struct UnknownTable(pub String);

/// Identifier of an ingestible table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableName {
    Employees,
    Departments,
    Jobs,
}

impl TableName {
    /// Every table in the registry, in a stable order
    pub const ALL: &'static [TableName] =
        &[TableName::Employees, TableName::Departments, TableName::Jobs];

    /// The store-side table name
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Employees => "employees",
            TableName::Departments => "departments",
            TableName::Jobs => "jobs",
        }
    }

    /// The static descriptor for this table
    pub fn descriptor(&self) -> &'static TableDescriptor {
        match self {
            TableName::Employees => &EMPLOYEES,
            TableName::Departments => &DEPARTMENTS,
            TableName::Jobs => &JOBS,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employees" => Ok(TableName::Employees),
            "departments" => Ok(TableName::Departments),
            "jobs" => Ok(TableName::Jobs),
            other => Err(UnknownTable(other.to_string())),
        }
    }
}

/// Resolve a table identifier against the registry
pub fn resolve(table_name: &str) -> Result<TableName, UnknownTable> {
    table_name.parse()
}

/// Coercion rule applied to one column of raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Required integer; a fractional textual representation is truncated
    Id,
    /// Free text; empty/missing input is preserved as NULL, never ""
    NullableText,
    /// Permissively parsed timestamp; empty/missing input is NULL
    Timestamp,
    /// Integer reference; empty/missing input defaults to the sentinel 0
    ForeignKey,
}

/// One column of a table descriptor
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Static schema description for one ingestible table
///
/// The column order doubles as the positional layout of input records.
#[derive(Debug)]
pub struct TableDescriptor {
    pub name: TableName,
    pub columns: &'static [ColumnSpec],
}

impl TableDescriptor {
    /// Number of fields every input record must carry
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Comma-separated column list for INSERT statements
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

static EMPLOYEES: TableDescriptor = TableDescriptor {
    name: TableName::Employees,
    columns: &[
        ColumnSpec { name: "id", kind: ColumnKind::Id },
        ColumnSpec { name: "name", kind: ColumnKind::NullableText },
        ColumnSpec { name: "datetime", kind: ColumnKind::Timestamp },
        ColumnSpec { name: "department_id", kind: ColumnKind::ForeignKey },
        ColumnSpec { name: "job_id", kind: ColumnKind::ForeignKey },
    ],
};

static DEPARTMENTS: TableDescriptor = TableDescriptor {
    name: TableName::Departments,
    columns: &[
        ColumnSpec { name: "id", kind: ColumnKind::Id },
        ColumnSpec { name: "department", kind: ColumnKind::NullableText },
    ],
};

static JOBS: TableDescriptor = TableDescriptor {
    name: TableName::Jobs,
    columns: &[
        ColumnSpec { name: "id", kind: ColumnKind::Id },
        ColumnSpec { name: "job", kind: ColumnKind::NullableText },
    ],
};
