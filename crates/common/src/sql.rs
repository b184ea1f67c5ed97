//! SQL text helpers shared by the resolver, the clause compiler and the
//! orchestrator: identifier wrapping, literal quoting, duplicate-key
//! classification and sample values for back-filled columns.

use crate::{Config, Delimiters, Engine, FixtureError, FixtureResult, RawError};
use rand::Rng;
use regex::{Regex, RegexSet};
use std::sync::LazyLock;
use types::SqlType;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?$").expect("numeric pattern is valid")
});

static DUPLICATE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bkey\s+\(?([^()=\s]+)\)?\s*=\s*\(?(.*?)\)?\s+already\s+exists")
        .expect("duplicate key pattern is valid")
});

/// Wrap every dot-separated identifier segment in the delimiters.
/// Segments that are already wrapped are left alone.
pub fn make_sql_safe(identifier: &str, delimiters: Delimiters) -> String {
    identifier
        .split('.')
        .map(|segment| {
            if is_wrapped(segment, delimiters) {
                segment.to_string()
            } else {
                format!("{}{segment}{}", delimiters.left, delimiters.right)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Strip exactly one layer of delimiters from every dot-separated segment.
pub fn make_sql_unsafe(identifier: &str, delimiters: Delimiters) -> String {
    identifier
        .split('.')
        .map(|segment| {
            if is_wrapped(segment, delimiters) {
                let inner = &segment[delimiters.left.len_utf8()..];
                &inner[..inner.len() - delimiters.right.len_utf8()]
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn is_wrapped(segment: &str, delimiters: Delimiters) -> bool {
    segment.chars().count() >= 2
        && segment.starts_with(delimiters.left)
        && segment.ends_with(delimiters.right)
}

/// True for integer and decimal literals without leading zeros.
pub fn is_numeric(value: &str) -> bool {
    NUMERIC.is_match(value)
}

/// Literal quoting policy for one engine.
#[derive(Clone, Debug)]
pub struct Quoter {
    engine: Engine,
    not_quotable: RegexSet,
}

impl Quoter {
    pub fn new(config: &Config) -> FixtureResult<Self> {
        let patterns = config
            .not_quotable
            .iter()
            .map(|pattern| format!("(?i)^(?:{pattern})$"));
        let not_quotable = RegexSet::new(patterns)
            .map_err(|err| FixtureError::Config(format!("invalid not-quotable pattern: {err}")))?;
        Ok(Self {
            engine: config.engine,
            not_quotable,
        })
    }

    /// Wrap in single quotes, escaping embedded quotes for the engine.
    pub fn quote(&self, value: &str) -> String {
        let escaped = if self.engine.backslash_escapes() {
            value.replace('\\', "\\\\").replace('\'', "\\'")
        } else {
            value.replace('\'', "''")
        };
        format!("'{escaped}'")
    }

    /// Numeric literals and configured keywords pass through; everything
    /// else is quoted.
    pub fn quote_or_not(&self, value: &str) -> String {
        if is_numeric(value) || self.not_quotable.is_match(value) {
            value.to_string()
        } else {
            self.quote(value)
        }
    }
}

/// Column and value named by a duplicate-key failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateKey {
    pub column: String,
    pub value: String,
}

/// Classify a raw executor error as a duplicate-key conflict.
///
/// Matches `Key <column>=<value> already exists` (and the parenthesised
/// PostgreSQL form `Key (column)=(value) already exists`) anywhere in the
/// message. Returns `None` for any other text.
pub fn key_from_duplicate_error(error: &RawError) -> Option<DuplicateKey> {
    let captures = DUPLICATE_KEY.captures(&error.message)?;
    Some(DuplicateKey {
        column: captures[1].to_string(),
        value: captures[2].to_string(),
    })
}

/// A schema-plausible SQL literal for a column of the given type.
pub fn sample_data(ty: SqlType) -> String {
    let mut rng = rand::thread_rng();
    match ty {
        SqlType::Int => rng.gen_range(1..=i64::from(i32::MAX)).to_string(),
        SqlType::Float => format!("{}.5", rng.gen_range(1..=99_999)),
        SqlType::Bool => "false".into(),
        SqlType::Char => "'f'".into(),
        SqlType::Text => format!("'fixture-{}'", uuid::Uuid::new_v4().simple()),
        SqlType::Uuid => format!("'{}'", uuid::Uuid::new_v4()),
        SqlType::Date => "'2000-01-01'".into(),
        SqlType::Time => "'00:00:00'".into(),
        SqlType::DateTime => "'2000-01-01 00:00:00'".into(),
    }
}
