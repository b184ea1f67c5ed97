//! Custom assertion helpers for fixture tests.

use crate::executor::ScriptedExecutor;
use common::FixtureResult;
use pretty_assertions::assert_eq;

/// Assert that the executor received exactly `expected`, in order.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use executor::StatementExecutor;
///
/// let mut executor = ScriptedExecutor::new(dev_config());
/// executor.push_affected(1);
/// executor.execute("DELETE FROM dev_user WHERE `id` = 1").unwrap();
/// assert_executed(&executor, &["DELETE FROM dev_user WHERE `id` = 1"]);
/// ```
pub fn assert_executed(executor: &ScriptedExecutor, expected: &[&str]) {
    let actual: Vec<&str> = executor.executed().iter().map(String::as_str).collect();
    assert_eq!(actual, expected, "executed statements differ");
}

/// Assert that nothing reached the executor.
pub fn assert_nothing_executed(executor: &ScriptedExecutor) {
    assert!(
        executor.executed().is_empty(),
        "expected no statements, got: {:?}",
        executor.executed()
    );
}

/// Assert that an operation returns an error whose message contains
/// `expected_msg`.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let result: common::FixtureResult<()> =
///     Err(common::FixtureError::UnknownKeyword("user.id".into()));
/// assert_error_contains(result, "user.id");
/// ```
pub fn assert_error_contains<T>(result: FixtureResult<T>, expected_msg: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{expected_msg}', but got Ok"),
        Err(e) => {
            let error_string = e.to_string();
            assert!(
                error_string.contains(expected_msg),
                "Expected error to contain '{expected_msg}', but got: {error_string}"
            );
        }
    }
}
