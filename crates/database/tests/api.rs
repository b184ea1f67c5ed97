//! Integration tests for the fixture operations against a scripted executor.

use anyhow::Result;
use common::FixtureError;
use compiler::CommandKind;
use database::FixtureApi;
use executor::RawError;
use pretty_assertions::assert_eq;
use testsupport::prelude::*;
use types::{SqlType, Value};

fn api(executor: ScriptedExecutor) -> FixtureApi<ScriptedExecutor> {
    FixtureApi::new(executor).expect("dev config is valid")
}

const UPDATE_SET: &str = "column1:abc,column2:xyz,column3:NULL,column4:what's up doc";
const UPDATE_WHERE: &str = "id:134,photo:!NULL,column:what's up doc";

#[test]
fn insert_probes_inserts_and_reads_back() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config()).with_last_insert_id(5);
    executor
        .push_empty()
        .push_affected(1)
        .push_rows(row(&[("id", Value::Int(5)), ("column1", Value::from("abc"))]));
    let mut api = api(executor);

    let outcome = api.insert("database.unique1", "column1:abc")?;

    assert_eq!(
        outcome.sql,
        "INSERT INTO dev_database.unique1 (`column1`) VALUES ('abc')"
    );
    assert!(!outcome.existing);
    assert_eq!(outcome.row["column1"], Value::from("abc"));
    assert_executed(
        api.executor(),
        &[
            "SELECT * FROM dev_database.unique1 WHERE `column1` = 'abc'",
            "INSERT INTO dev_database.unique1 (`column1`) VALUES ('abc')",
            "SELECT * FROM dev_database.unique1 WHERE `id` = 5",
        ],
    );
    assert_eq!(api.last_command_kind(), Some(CommandKind::Select));
    assert!(api.entity().is_some());
    assert_eq!(api.keywords().lookup("unique1")?, &Value::Int(5));
    assert_eq!(api.keywords().lookup("unique1.id")?, &Value::Int(5));
    assert_eq!(api.keywords().lookup("unique1.column1")?, &Value::from("abc"));
    Ok(())
}

#[test]
fn insert_without_generated_id_remembers_read_back_key() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config()).with_last_insert_id(0);
    executor.push_empty().push_affected(1).push_rows(user_row(42));
    let mut api = api(executor);

    api.insert("user", "email:a@b.com")?;

    assert_eq!(
        api.executor().executed().last().map(String::as_str),
        Some("SELECT * FROM dev_user WHERE `email` = 'a@b.com'")
    );
    assert_eq!(api.keywords().lookup("user")?, &Value::Int(42));
    assert_eq!(api.keywords().lookup("user.id")?, &Value::Int(42));
    Ok(())
}

#[test]
fn insert_back_fills_required_columns() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config())
        .with_last_insert_id(9)
        .with_required_columns([("email", SqlType::Text), ("created", SqlType::Date)]);
    executor.push_empty().push_affected(1).push_rows(user_row(9));
    let mut api = api(executor);

    let outcome = api.insert("user", "email:a@b.com")?;

    assert_eq!(
        outcome.sql,
        "INSERT INTO dev_user (`email`, `created`) VALUES ('a@b.com', '2000-01-01')"
    );
    Ok(())
}

#[test]
fn insert_returns_existing_row_without_writing() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_rows(user_row(12));
    let mut api = api(executor);

    let outcome = api.insert("user", "email:its.inevitable@hotmail.com")?;

    assert!(outcome.existing);
    assert_eq!(
        outcome.sql,
        "SELECT * FROM dev_user WHERE `email` = 'its.inevitable@hotmail.com'"
    );
    assert_eq!(api.executor().executed().len(), 1);
    assert_eq!(api.keywords().lookup("user")?, &Value::Int(12));
    assert_eq!(api.keywords().lookup("user.name")?, &Value::from("Abdul"));
    assert_eq!(api.last_command_kind(), Some(CommandKind::Select));
    Ok(())
}

#[test]
fn duplicate_key_falls_back_to_lookup() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor
        .push_empty()
        .push_error(RawError::new(
            "23505",
            "7",
            "ERROR: duplicate key value violates unique constraint \"user_email_key\"\nDETAIL: Key (email)=(a@b.com) already exists.",
        ))
        .push_rows(user_row(3));
    let mut api = api(executor);

    let outcome = api.insert("user", "email:a@b.com,name:Abdul")?;

    assert!(outcome.existing);
    assert_eq!(
        outcome.sql,
        "INSERT INTO dev_user (`email`, `name`) VALUES ('a@b.com', 'Abdul')"
    );
    assert_eq!(
        api.executor().executed().last().map(String::as_str),
        Some("SELECT * FROM dev_user WHERE `email` = 'a@b.com'")
    );
    assert_eq!(api.keywords().lookup("user")?, &Value::Int(3));
    assert_eq!(api.last_command_kind(), Some(CommandKind::Select));
    Ok(())
}

#[test]
fn duplicate_key_without_existing_row_is_select_error() {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor
        .push_empty()
        .push_error(RawError::message("error DETAIL: Key asdf=123 already exists."))
        .push_empty();
    let mut api = api(executor);

    assert_error_matches!(
        api.insert("user", "asdf:123"),
        FixtureError::Select { sql } if sql == "SELECT * FROM dev_user WHERE `asdf` = 123"
    );
}

#[test]
fn other_insert_failures_propagate() {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor
        .push_empty()
        .push_error(RawError::new("42S02", "1146", "Table 'mydb.dev_user' doesn't exist"));
    let mut api = api(executor);

    let err = api.insert("user", "email:a@b.com").unwrap_err();
    assert!(err.is_execution());
    assert_eq!(
        err.sql(),
        Some("INSERT INTO dev_user (`email`) VALUES ('a@b.com')")
    );
    assert!(err.to_string().contains("doesn't exist"));
}

#[test]
fn delete_with_where() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_affected(1);
    let mut api = api(executor);

    let sql = api.delete("database.someTable", UPDATE_SET)?;

    assert_eq!(
        sql,
        r"DELETE FROM dev_database.someTable WHERE `column1` = 'abc' AND `column2` = 'xyz' AND `column3` is NULL AND `column4` = 'what\'s up doc'"
    );
    assert_eq!(api.last_command_kind(), Some(CommandKind::Delete));
    Ok(())
}

#[test]
fn delete_refuses_bad_input_before_executing() {
    let mut api = api(ScriptedExecutor::new(dev_config()));

    assert_error_matches!(api.delete("", ""), FixtureError::InvalidEntity(_));
    assert_error_matches!(api.delete("abc", ""), FixtureError::NoWhereClause { kind } if kind == "delete");
    assert_nothing_executed(api.executor());
}

#[test]
fn delete_of_nothing_is_an_error() {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_affected(0);
    let mut api = api(executor);

    assert_error_matches!(api.delete("user", "id:1"), FixtureError::NoRowsAffected { .. });
}

#[test]
fn update_refuses_bad_input_before_executing() {
    let mut api = api(ScriptedExecutor::new(dev_config()));

    assert_error_matches!(api.update("", "", ""), FixtureError::InvalidEntity(_));
    assert_error_matches!(api.update("abc", "", ""), FixtureError::NoWhereClause { .. });
    assert_error_matches!(api.update("abc", "a:1", ""), FixtureError::NoWhereClause { .. });
    assert_nothing_executed(api.executor());
}

#[test]
fn update_with_values() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    let found = row(&[
        ("email", Value::from("its.inevitable@hotmail.com")),
        ("name", Value::from("Abdul")),
    ]);
    executor.push_rows(found.clone()).push_rows(found);
    let mut api = api(executor);

    let outcome = api.update("database.someTable2", UPDATE_SET, UPDATE_WHERE)?;

    assert_eq!(
        outcome.sql,
        r"UPDATE dev_database.someTable2 SET `column1` = 'abc', `column2` = 'xyz', `column3` = NULL, `column4` = 'what\'s up doc' WHERE `id` = 134 AND `photo` is not NULL AND `column` = 'what\'s up doc'"
    );
    insta::assert_snapshot!(
        api.executor().executed()[1],
        @r"SELECT * FROM dev_database.someTable2 WHERE `id` = 134 AND `photo` is not NULL AND `column` = 'what\'s up doc' AND `column1` = 'abc' AND `column2` = 'xyz' AND `column3` is NULL AND `column4` = 'what\'s up doc'"
    );
    assert_eq!(api.last_command_kind(), Some(CommandKind::Select));
    assert_eq!(
        api.keywords().lookup("someTable2.name")?,
        &Value::from("Abdul")
    );
    Ok(())
}

#[test]
fn update_assigns_values_containing_percent() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor
        .push_affected(1)
        .push_rows(row(&[("id", Value::Int(1)), ("promo", Value::from("50% off"))]));
    let mut api = api(executor);

    let outcome = api.update("user", "promo:50% off", "id:1")?;

    assert_eq!(
        outcome.sql,
        "UPDATE dev_user SET `promo` = '50% off' WHERE `id` = 1"
    );
    assert_eq!(outcome.row["promo"], Value::from("50% off"));
    Ok(())
}

#[test]
fn update_of_nothing_is_an_error() {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_affected(0);
    let mut api = api(executor);

    assert_error_matches!(
        api.update("user", "name:x", "id:1"),
        FixtureError::NoRowsAffected { sql } if sql.starts_with("UPDATE dev_user SET")
    );
    assert_eq!(api.last_command_kind(), Some(CommandKind::Update));
}

#[test]
fn select_returns_first_row() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_rows(row(&[("id", Value::Int(5)), ("name", Value::from("Abdul"))]));
    let mut api = api(executor);

    let found = api.select("database.someTable2", UPDATE_SET)?;

    assert_eq!(found["id"], Value::Int(5));
    assert_eq!(found["name"], Value::from("Abdul"));
    assert_executed(
        api.executor(),
        &[r"SELECT * FROM dev_database.someTable2 WHERE `column1` = 'abc' AND `column2` = 'xyz' AND `column3` is NULL AND `column4` = 'what\'s up doc'"],
    );
    Ok(())
}

#[test]
fn select_without_match_fails() {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_empty();
    let mut api = api(executor);

    let err = api
        .select("database.someTable4", "column1:abc,column2:xyz,column3:!NULL")
        .unwrap_err();
    assert!(err.is_select());
    assert_eq!(
        err.sql(),
        Some("SELECT * FROM dev_database.someTable4 WHERE `column1` = 'abc' AND `column2` = 'xyz' AND `column3` is not NULL")
    );
}

#[test]
fn assert_exists_returns_sql() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_rows(user_row(1)).push_rows(user_row(1));
    let mut api = api(executor);

    assert_eq!(
        api.assert_exists("database.someTable4", "column1:abc,column2:xyz,column3:!NULL")?,
        "SELECT * FROM dev_database.someTable4 WHERE `column1` = 'abc' AND `column2` = 'xyz' AND `column3` is not NULL"
    );
    assert_eq!(api.last_command_kind(), Some(CommandKind::Select));

    assert_eq!(
        api.assert_exists("database.someTable4", "column1:abc,column2:%xyz%")?,
        "SELECT * FROM dev_database.someTable4 WHERE `column1` = 'abc' AND `column2` LIKE '%xyz%'"
    );
    Ok(())
}

#[test]
fn assert_not_exists() -> Result<()> {
    let with = "column1:abc,column2:xyz,column3:what's up doc";
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_empty().push_rows(user_row(1));
    let mut api = api(executor);

    assert_eq!(
        api.assert_not_exists("database.someTable3", with)?,
        r"SELECT * FROM dev_database.someTable3 WHERE `column1` = 'abc' AND `column2` = 'xyz' AND `column3` = 'what\'s up doc'"
    );
    assert_error_matches!(
        api.assert_not_exists("database.someTable3", with),
        FixtureError::RowExists { .. }
    );
    Ok(())
}

#[test]
fn count_reads_first_value() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_rows(count_row("someTable2", 5));
    let mut api = api(executor);

    assert_eq!(api.count("database.someTable2", UPDATE_SET)?, 5);
    assert_executed(
        api.executor(),
        &[r"SELECT COUNT(*) AS SELECT_COUNT_someTable2 FROM dev_database.someTable2 WHERE `column1` = 'abc' AND `column2` = 'xyz' AND `column3` is NULL AND `column4` = 'what\'s up doc'"],
    );
    assert_eq!(api.last_command_kind(), Some(CommandKind::Count));
    Ok(())
}

#[test]
fn count_accepts_driver_text() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_rows(row(&[("SELECT_COUNT_user", Value::from("17"))]));
    let mut api = api(executor);

    assert_eq!(api.count("user", "")?, 17);
    assert_executed(
        api.executor(),
        &["SELECT COUNT(*) AS SELECT_COUNT_user FROM dev_user"],
    );
    Ok(())
}

#[test]
fn keywords_flow_between_operations() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config()).with_last_insert_id(42);
    executor
        .push_empty()
        .push_affected(1)
        .push_rows(user_row(42))
        .push_affected(1);
    let mut api = api(executor);

    api.insert("user", "email:its.inevitable@hotmail.com")?;
    let sql = api.delete("post", "owner_id:{user.id},title:by {user.name}")?;

    assert_eq!(
        sql,
        "DELETE FROM dev_post WHERE `owner_id` = 42 AND `title` = 'by Abdul'"
    );
    assert_error_matches!(
        api.select("post", "id:{post.id}"),
        FixtureError::UnknownKeyword(name) if name == "post.id"
    );
    Ok(())
}

#[test]
fn external_references_render_subqueries() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_affected(2);
    let mut api = api(executor);

    let sql = api.delete("post", "owner_id:[user.id|email:a@b.com]")?;
    assert_eq!(
        sql,
        "DELETE FROM dev_post WHERE `owner_id` = (SELECT `id` FROM dev_user WHERE `email` = 'a@b.com')"
    );
    Ok(())
}

#[test]
fn history_records_statements_until_reset() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config()).with_last_insert_id(7);
    executor.push_empty().push_affected(1).push_rows(user_row(7));
    let mut api = api(executor);

    api.insert("user", "name:Abdul")?;

    let kinds: Vec<CommandKind> = api.history().entries().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![CommandKind::Select, CommandKind::Insert, CommandKind::Select]
    );
    let insert = api.history().of_kind(CommandKind::Insert).next().unwrap();
    assert_eq!(insert.last_id, Some(7));
    assert_eq!(insert.entity, "dev_user");

    api.reset_session();
    assert!(api.history().is_empty());
    assert!(api.keywords().is_empty());
    assert_eq!(api.last_command_kind(), None);
    assert!(api.entity().is_none());
    Ok(())
}

#[test]
fn fixture_tables_insert_each_row() -> Result<()> {
    let mut executor = ScriptedExecutor::new(dev_config());
    executor.push_rows(user_row(1)).push_rows(user_row(2));
    let mut api = api(executor);

    let table = parser::FixtureTable::new(["email", "name"])
        .with_row(["a@b.com", "Abdul"])
        .with_row(["c@d.com", "Smith, John"]);
    let outcomes = api.insert_table("user", &table)?;

    assert_eq!(outcomes.len(), 2);
    assert_executed(
        api.executor(),
        &[
            "SELECT * FROM dev_user WHERE `email` = 'a@b.com' AND `name` = 'Abdul'",
            "SELECT * FROM dev_user WHERE `email` = 'c@d.com' AND `name` = 'Smith, John'",
        ],
    );
    Ok(())
}
