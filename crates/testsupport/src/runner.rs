//! Fixture script execution for snapshot testing.
//!
//! A script is one step per line, `|` separating the operation's arguments:
//!
//! ```text
//! # comments and blank lines are skipped
//! insert user | email:a@b.com,name:Abdul
//! update user | name:Bob | id:{user.id}
//! select user | id:{user.id}
//! count user | name:Bob
//! exists user | name:Bob
//! not-exists user | name:Abdul
//! delete user | id:{user.id}
//! ```
//!
//! Each step's output (SQL, rows, counts or the error) is appended to a
//! transcript suitable for `insta` snapshots.

use common::{
    FixtureError, FixtureResult, RowMap,
    pretty::{self, TableStyleKind},
};
use database::FixtureApi;
use executor::StatementExecutor;

/// Run `script` against `api` and return the transcript.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use database::FixtureApi;
///
/// let mut executor = ScriptedExecutor::new(dev_config());
/// executor.push_affected(1);
/// let mut api = FixtureApi::new(executor).unwrap();
///
/// let output = run_fixture_script(&mut api, "delete user | id:5");
/// assert_eq!(output, "DELETE FROM dev_user WHERE `id` = 5");
/// ```
pub fn run_fixture_script<E: StatementExecutor>(api: &mut FixtureApi<E>, script: &str) -> String {
    let mut output = String::new();

    for line in script.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = match run_step(api, line) {
            Ok(text) => text,
            Err(e) => format!("Error: {e}"),
        };
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&step);
    }

    output
}

fn run_step<E: StatementExecutor>(api: &mut FixtureApi<E>, line: &str) -> FixtureResult<String> {
    let mut parts = split_arguments(line).into_iter();
    let head = parts.next().unwrap_or_default();
    let (op, entity) = head
        .split_once(char::is_whitespace)
        .map(|(op, entity)| (op, entity.trim()))
        .ok_or_else(|| FixtureError::malformed(line, "expected '<operation> <entity>'"))?;
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();

    match op {
        "insert" => {
            let outcome = api.insert(entity, first)?;
            Ok(format!("{}\n{}", outcome.sql, render_row(&outcome.row)))
        }
        "update" => {
            let outcome = api.update(entity, first, second)?;
            Ok(format!("{}\n{}", outcome.sql, render_row(&outcome.row)))
        }
        "delete" => api.delete(entity, first),
        "select" => api.select(entity, first).map(|row| render_row(&row)),
        "count" => api.count(entity, first).map(|n| format!("count: {n}")),
        "exists" => api.assert_exists(entity, first),
        "not-exists" => api.assert_not_exists(entity, first),
        other => Err(FixtureError::UnknownCommandKind(other.to_string())),
    }
}

/// Split on `|` outside `[...]` groups, so external references survive.
fn split_arguments(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(line[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(line[start..].trim());
    parts
}

/// Render a row as a two-column table, columns sorted by name.
pub fn render_row(row: &RowMap) -> String {
    let mut cells: Vec<Vec<String>> = row
        .iter()
        .map(|(column, value)| vec![column.clone(), value.to_string()])
        .collect();
    cells.sort();
    pretty::render_string_table(&["column", "value"], cells, TableStyleKind::Ascii)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use types::Value;

    #[test]
    fn errors_are_part_of_the_transcript() {
        let mut api = FixtureApi::new(ScriptedExecutor::new(dev_config())).unwrap();
        let output = run_fixture_script(&mut api, "delete user |\nfrobnicate user | a:1");
        assert_eq!(
            output,
            "Error: delete requires a WHERE clause; refusing whole-table operation\n\
             Error: unknown command kind 'frobnicate'"
        );
        assert_nothing_executed(api.executor());
    }

    #[test]
    fn arguments_keep_external_references() {
        assert_eq!(
            split_arguments("insert post | owner:[user.id|email:a@b.com] | x"),
            vec!["insert post", "owner:[user.id|email:a@b.com]", "x"]
        );
    }

    #[test]
    fn rows_render_sorted() {
        let row: RowMap = [
            ("name".to_string(), Value::from("Abdul")),
            ("id".to_string(), Value::Int(5)),
        ]
        .into_iter()
        .collect();
        let rendered = render_row(&row);
        let id_at = rendered.find("id").unwrap();
        let name_at = rendered.find("name").unwrap();
        assert!(id_at < name_at);
    }
}
