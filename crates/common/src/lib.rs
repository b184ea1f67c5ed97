
pub mod config;
pub mod pretty;
pub mod sql;

pub use config::{Config, Delimiters, Engine};

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io};
use thiserror::Error;
use types::Value;

/// Positional row representation backed by `types::Value`.
/// Examples:
/// - `let row = Row::new(vec![Value::Int(1)]);`
/// - `let row = Row::new(vec![Value::Text("alice".into()), Value::Bool(true)]);`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Named projection of a row keyed by column name.
/// Examples:
/// - `let map = RowMap::from([("id".into(), Value::Int(5))]);`
/// - `let map = RowMap::from([("deleted_at".into(), Value::Null)]);`
pub type RowMap = HashMap<String, Value>;

/// Result of executing one statement: the fetched rows (if any) and the
/// number of rows a write affected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
}

impl RecordBatch {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            columns,
            rows,
            rows_affected,
        }
    }

    /// Result of a write that fetched nothing.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected,
        }
    }

    pub fn has_fetched_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// First row keyed by column name.
    pub fn first_row(&self) -> Option<RowMap> {
        let row = self.rows.first()?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.values.iter().cloned())
                .collect(),
        )
    }

    /// First column of the first row.
    pub fn first_value(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.values.first())
    }
}

/// Native error surface of a statement executor: `(sql_state, driver_code, message)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawError {
    pub sql_state: String,
    pub driver_code: String,
    pub message: String,
}

impl RawError {
    pub fn new(
        sql_state: impl Into<String>,
        driver_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sql_state: sql_state.into(),
            driver_code: driver_code.into(),
            message: message.into(),
        }
    }

    /// Error carrying only a message, for drivers without SQLSTATE codes.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new("", "", message)
    }
}

impl std::fmt::Display for RawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sql_state.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "[{}] {}", self.sql_state, self.message)
        }
    }
}

/// Canonical error type shared across the fixture crates.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("invalid entity: {0}")]
    InvalidEntity(String),
    #[error("malformed DSL '{input}': {reason}")]
    MalformedDsl { input: String, reason: String },
    #[error("unknown keyword '{0}'")]
    UnknownKeyword(String),
    #[error("unknown command kind '{0}'")]
    UnknownCommandKind(String),
    #[error("{kind} requires a WHERE clause; refusing whole-table operation")]
    NoWhereClause { kind: String },
    #[error("{kind} requires a {clause} clause")]
    MissingClause { kind: String, clause: String },
    #[error("invalid pipeline state: {0}")]
    InvalidPipelineState(String),
    #[error("no record found: {sql}")]
    Select { sql: String },
    #[error("record found but none was expected: {sql}")]
    RowExists { sql: String },
    #[error("no rows affected: {sql}")]
    NoRowsAffected { sql: String },
    #[error("execution failed: {message} (sql: {sql})")]
    Execution { sql: String, message: String },
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FixtureError {
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        FixtureError::MalformedDsl {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if a write was refused for lack of predicate columns.
    pub fn is_no_where_clause(&self) -> bool {
        matches!(self, FixtureError::NoWhereClause { .. })
    }

    /// Returns true if a select expected a row and found none.
    pub fn is_select(&self) -> bool {
        matches!(self, FixtureError::Select { .. })
    }

    /// Returns true if the executor rejected the statement.
    pub fn is_execution(&self) -> bool {
        matches!(self, FixtureError::Execution { .. })
    }

    /// The rendered SQL the failure relates to, when there is one.
    pub fn sql(&self) -> Option<&str> {
        match self {
            FixtureError::Select { sql }
            | FixtureError::RowExists { sql }
            | FixtureError::NoRowsAffected { sql }
            | FixtureError::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Result alias that carries a `FixtureError`.
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        Config, Delimiters, Engine, FixtureError, FixtureResult, RawError, RecordBatch, Row,
        RowMap,
    };
    pub use types::{SqlType, Value};
}
