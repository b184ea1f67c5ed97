//! Declarative macros for fixture tests.

/// Asserts that a `FixtureResult` failed with an error matching a pattern.
///
/// # Examples
///
/// ```
/// use testsupport::assert_error_matches;
/// use common::{FixtureError, FixtureResult};
///
/// let result: FixtureResult<()> = Err(FixtureError::NoWhereClause { kind: "delete".into() });
/// assert_error_matches!(result, FixtureError::NoWhereClause { .. });
///
/// let result: FixtureResult<()> = Err(FixtureError::UnknownKeyword("user.id".into()));
/// assert_error_matches!(result, FixtureError::UnknownKeyword(name) if name == "user.id");
/// ```
#[macro_export]
macro_rules! assert_error_matches {
    ($result:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {
        match $result {
            Err($pattern) $(if $guard)? => {}
            Err(other) => panic!(
                "expected error matching `{}`, got: {:?}",
                stringify!($pattern),
                other
            ),
            Ok(_) => panic!("expected error matching `{}`, got Ok", stringify!($pattern)),
        }
    };
}

/// Builds a single-row `RecordBatch` from `column => value` pairs.
///
/// # Examples
///
/// ```
/// use testsupport::row;
/// use types::Value;
///
/// let batch = row!["id" => 5i64, "name" => "Abdul", "deleted_at" => Value::Null];
/// assert_eq!(batch.columns, vec!["id", "name", "deleted_at"]);
/// assert_eq!(batch.rows[0].values[0], Value::Int(5));
/// ```
#[macro_export]
macro_rules! row {
    [$($column:expr => $value:expr),+ $(,)?] => {
        $crate::fixtures::row(&[$(($column, ::types::Value::from($value))),+])
    };
}
