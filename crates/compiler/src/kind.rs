use common::FixtureError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// SQL statement category governing how clauses are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
    Count,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Select => "select",
            CommandKind::Insert => "insert",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
            CommandKind::Count => "count",
        }
    }

    /// Writes must never run without a predicate.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            CommandKind::Insert | CommandKind::Update | CommandKind::Delete
        )
    }
}

impl FromStr for CommandKind {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(CommandKind::Select),
            "insert" => Ok(CommandKind::Insert),
            "update" => Ok(CommandKind::Update),
            "delete" => Ok(CommandKind::Delete),
            "count" => Ok(CommandKind::Count),
            _ => Err(FixtureError::UnknownCommandKind(s.to_string())),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Separator between compiled terms: predicates join with `AND`,
/// assignments with a comma.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Glue {
    And,
    Comma,
}

impl Glue {
    pub fn as_str(self) -> &'static str {
        match self {
            Glue::And => " AND ",
            Glue::Comma => ", ",
        }
    }
}
