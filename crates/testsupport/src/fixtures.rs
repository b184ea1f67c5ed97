//! Common test fixtures: configs, rows and record batches.

use common::{Config, RecordBatch, Row};
use types::Value;

/// Config used across the suite: `dev_` prefix, database `mydb`, schema
/// `myschema`, MySQL quoting.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let config = dev_config();
/// assert_eq!(config.prefix, "dev_");
/// ```
pub fn dev_config() -> Config {
    Config::builder()
        .prefix("dev_")
        .database("mydb")
        .schema("myschema")
        .build()
}

/// Single-row result set from `(column, value)` pairs.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use types::Value;
///
/// let batch = row(&[("id", Value::Int(5)), ("name", Value::from("Abdul"))]);
/// assert_eq!(batch.columns, vec!["id", "name"]);
/// assert_eq!(batch.rows_affected, 1);
/// ```
pub fn row(pairs: &[(&str, Value)]) -> RecordBatch {
    let (columns, values): (Vec<String>, Vec<Value>) = pairs
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .unzip();
    RecordBatch::new(columns, vec![Row::new(values)])
}

/// Multi-row result set.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use types::Value;
///
/// let batch = batch(&["id"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
/// assert_eq!(batch.rows.len(), 2);
/// ```
pub fn batch(columns: &[&str], rows: Vec<Vec<Value>>) -> RecordBatch {
    RecordBatch::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.into_iter().map(Row::new).collect(),
    )
}

/// Result of `SELECT COUNT(*) AS SELECT_COUNT_<table>`.
pub fn count_row(table: &str, count: i64) -> RecordBatch {
    let column = format!("SELECT_COUNT_{table}");
    row(&[(column.as_str(), Value::Int(count))])
}

/// The `user` row most scenarios work with.
pub fn user_row(id: i64) -> RecordBatch {
    row(&[
        ("id", Value::Int(id)),
        ("email", Value::from("its.inevitable@hotmail.com")),
        ("name", Value::from("Abdul")),
    ])
}
