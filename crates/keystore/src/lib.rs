//! Session-scoped registry of values produced by earlier statements, so a
//! later fixture can refer to them as `{name}` (e.g. `user_id:{user.id}`).
//!
//! One store per test session. The store does no locking; parallel
//! scenarios each own their own instance.

use ahash::RandomState;
use common::{FixtureError, FixtureResult, RowMap};
use hashbrown::HashMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use types::Value;

type Map<K, V> = HashMap<K, V, RandomState>;

static KEYWORD_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("keyword pattern is valid")
});

/// Name -> value registry.
#[derive(Clone, Debug, Default)]
pub struct KeywordStore {
    entries: Map<String, Value>,
}

impl KeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`, replacing any previous entry.
    pub fn remember(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Register every column of `row` as `<table>.<column>`.
    pub fn remember_row(&mut self, table: &str, row: &RowMap) {
        for (column, value) in row {
            self.remember(format!("{table}.{column}"), value.clone());
        }
    }

    pub fn lookup(&self, name: &str) -> FixtureResult<&Value> {
        self.entries
            .get(name)
            .ok_or_else(|| FixtureError::UnknownKeyword(name.to_string()))
    }

    pub fn try_lookup(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Drop every entry; called at session boundaries.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitute every `{name}` reference in `text`.
    ///
    /// Fails with `UnknownKeyword` on the first unregistered name. Text
    /// without references is returned unchanged.
    pub fn parse_keywords_in(&self, text: &str) -> FixtureResult<String> {
        if !KEYWORD_REF.is_match(text) {
            return Ok(text.to_string());
        }

        let mut missing = None;
        let replaced = KEYWORD_REF.replace_all(text, |caps: &Captures<'_>| {
            match self.try_lookup(&caps[1]) {
                Some(value) => value.to_string(),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(FixtureError::UnknownKeyword(name)),
            None => Ok(replaced.into_owned()),
        }
    }
}

/// The keyword name if `value` is exactly one `{name}` reference.
pub fn reference_name(value: &str) -> Option<&str> {
    let caps = KEYWORD_REF.captures(value)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == value.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}
