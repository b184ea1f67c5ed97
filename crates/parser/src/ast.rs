use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EXTERNAL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*([^\[\]|]+)\.([^\[\]|.]+?)\s*\|(.*)\]$").expect("external ref pattern is valid")
});

/// Column -> raw value mapping in input order.
///
/// Inserting an existing column replaces its value but keeps its position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap(IndexMap<String, String>);

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Render back to DSL text, escaping every delimiter so that
    /// `parse_to_map(&map.to_dsl())` reproduces the map. Surrounding
    /// whitespace of columns and values is not preserved by parsing.
    pub fn to_dsl(&self) -> String {
        self.iter()
            .map(|(column, value)| format!("{}:{}", escape(column), escape(value)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ColumnMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | ',' | ':' | '[' | ']') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Lookup of a value in another table: `[table.column|criteria]`.
///
/// `criteria` is itself DSL text and is compiled as a select predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub entity: String,
    pub column: String,
    pub criteria: String,
}

/// Classified DSL value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnValue {
    Literal(String),
    Null,
    NotNull,
    Like(String),
    KeywordRef(String),
    ExternalRef(ExternalRef),
}

impl ColumnValue {
    /// Classify a raw value. `NULL`/`!NULL` are case-insensitive and win
    /// over every other shape; a `%` anywhere makes a LIKE pattern.
    pub fn classify(raw: &str) -> ColumnValue {
        if raw.eq_ignore_ascii_case("NULL") {
            return ColumnValue::Null;
        }
        if raw.eq_ignore_ascii_case("!NULL") {
            return ColumnValue::NotNull;
        }
        if let Some(caps) = EXTERNAL_REF.captures(raw) {
            return ColumnValue::ExternalRef(ExternalRef {
                entity: caps[1].trim().to_string(),
                column: caps[2].trim().to_string(),
                criteria: caps[3].trim().to_string(),
            });
        }
        if let Some(name) = keystore::reference_name(raw) {
            return ColumnValue::KeywordRef(name.to_string());
        }
        if raw.contains('%') {
            return ColumnValue::Like(raw.to_string());
        }
        ColumnValue::Literal(raw.to_string())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ColumnValue::Literal(_) => "Literal",
            ColumnValue::Null => "Null",
            ColumnValue::NotNull => "NotNull",
            ColumnValue::Like(_) => "Like",
            ColumnValue::KeywordRef(_) => "KeywordRef",
            ColumnValue::ExternalRef(_) => "ExternalRef",
        }
    }
}
