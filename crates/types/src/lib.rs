use std::fmt;

/// Declared type of a table column, as reported by schema introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    Int,
    Float,
    Bool,
    Char,
    Text,
    Uuid,
    Date,
    Time,
    DateTime,
}

impl SqlType {
    /// Map a driver-reported type name onto a `SqlType`.
    ///
    /// Length and precision suffixes are ignored (`varchar(255)` is `Text`).
    /// Unrecognised names fall back to `Text`.
    pub fn from_declared(declared: &str) -> SqlType {
        let lowered = declared.trim().to_ascii_lowercase();
        let base = lowered
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_end_matches(" unsigned");

        match base {
            "int" | "integer" | "smallint" | "bigint" | "tinyint" | "mediumint" | "serial"
            | "bigserial" | "smallserial" | "int2" | "int4" | "int8" => SqlType::Int,
            "float" | "double" | "double precision" | "real" | "decimal" | "numeric"
            | "money" | "float4" | "float8" => SqlType::Float,
            "bool" | "boolean" | "bit" => SqlType::Bool,
            "char" | "character" | "nchar" => SqlType::Char,
            "uuid" | "uniqueidentifier" => SqlType::Uuid,
            "date" => SqlType::Date,
            "time" => SqlType::Time,
            _ if base.starts_with("timestamp") || base.starts_with("datetime") => {
                SqlType::DateTime
            }
            _ if base.starts_with("time ") => SqlType::Time,
            _ => SqlType::Text,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, SqlType::Int | SqlType::Float)
    }
}

/// Scalar cell value returned by the statement executor.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of the value. Drivers commonly return aggregates as text,
    /// so numeric text is accepted as well.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
