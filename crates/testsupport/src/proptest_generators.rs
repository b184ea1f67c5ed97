//! Property-based test generators using proptest.
//!
//! Strategies for identifiers, executor values and DSL column maps.

use common::Row;
use parser::ColumnMap;
use proptest::prelude::*;
use types::{SqlType, Value};

/// Strategy for generating random `Value` instances.
///
/// Generates a mix of Int, Text, Bool, and Null values.
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        "[a-z]{1,20}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Strategy for generating random `Row` instances with 1-10 columns.
pub fn arb_row() -> impl Strategy<Value = Row> {
    prop::collection::vec(arb_value(), 1..10).prop_map(Row::new)
}

/// Strategy for generating random `SqlType` instances.
pub fn arb_sql_type() -> impl Strategy<Value = SqlType> {
    prop_oneof![
        Just(SqlType::Int),
        Just(SqlType::Float),
        Just(SqlType::Bool),
        Just(SqlType::Char),
        Just(SqlType::Text),
        Just(SqlType::Uuid),
        Just(SqlType::Date),
        Just(SqlType::Time),
        Just(SqlType::DateTime),
    ]
}

/// Unquoted SQL identifier: a letter followed by letters, digits or `_`.
pub fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}"
}

/// Plain literal that classifies as `Literal`: no NULL markers, keyword
/// braces, LIKE wildcards or surrounding whitespace.
pub fn arb_literal() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9@._' -]{1,20}"
        .prop_map(|s| s.trim().to_string())
        .prop_filter("non-empty, not NULL", |s| {
            !s.is_empty() && !s.eq_ignore_ascii_case("null") && !s.eq_ignore_ascii_case("!null")
        })
}

/// DSL value of any shape the compiler accepts in a predicate.
pub fn arb_dsl_value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_literal(),
        1 => Just("NULL".to_string()),
        1 => Just("!NULL".to_string()),
        1 => "[a-z]{1,6}".prop_map(|s| format!("%{s}%")),
        1 => any::<i32>().prop_map(|n| n.to_string()),
    ]
}

/// Column map with distinct columns, 1-6 entries.
pub fn arb_column_map() -> impl Strategy<Value = ColumnMap> {
    prop::collection::btree_map(arb_identifier(), arb_dsl_value(), 1..6)
        .prop_map(|entries| entries.into_iter().collect())
}
