//! Entity resolution: turns `database.table` or bare `table` references into
//! prefixed, fully-qualified names.

use common::{
    Config, Delimiters, FixtureError, FixtureResult,
    sql::{make_sql_safe, make_sql_unsafe},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved table reference. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    database: String,
    table: String,
    prefix: String,
    explicit_database: bool,
}

impl Entity {
    /// Database the entity lives in. An explicitly named database carries
    /// the prefix (`dev_abc`); the configured default does not (`mydb`).
    pub fn database_name(&self) -> String {
        if self.explicit_database {
            format!("{}{}", self.prefix, self.database)
        } else {
            self.database.clone()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn has_explicit_database(&self) -> bool {
        self.explicit_database
    }

    /// The unprefixed reference as written, e.g. `database.unique1` or `user`.
    pub fn name(&self) -> String {
        if self.explicit_database {
            format!("{}.{}", self.database, self.table)
        } else {
            self.table.clone()
        }
    }

    /// `prefix + database + "." + table`, or `prefix + table` when the
    /// database came from configuration.
    pub fn qualified(&self) -> String {
        if self.explicit_database {
            format!("{}{}.{}", self.prefix, self.database, self.table)
        } else {
            format!("{}{}", self.prefix, self.table)
        }
    }

    /// Qualified name with every segment wrapped in the delimiters.
    pub fn qualified_safe(&self, delimiters: Delimiters) -> String {
        make_sql_safe(&self.qualified(), delimiters)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Resolves raw entity strings against the configured prefix and default database.
#[derive(Clone, Debug)]
pub struct EntityResolver {
    prefix: String,
    default_database: String,
    delimiters: Delimiters,
}

impl EntityResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            prefix: config.prefix.clone(),
            default_database: config.database.clone(),
            delimiters: config.delimiters(),
        }
    }

    /// Split `raw` on its first `.` into database and table. User-supplied
    /// identifier quoting is stripped first.
    pub fn resolve(&self, raw: &str) -> FixtureResult<Entity> {
        let raw = make_sql_unsafe(raw.trim(), self.delimiters);
        if raw.is_empty() {
            return Err(FixtureError::InvalidEntity("entity name is empty".into()));
        }

        let (database, table, explicit_database) = match raw.split_once('.') {
            Some((database, table)) => {
                if database.trim().is_empty() || table.trim().is_empty() {
                    return Err(FixtureError::InvalidEntity(format!(
                        "'{raw}' must be 'database.table' or 'table'"
                    )));
                }
                (database.trim().to_string(), table.trim().to_string(), true)
            }
            None => (self.default_database.clone(), raw.clone(), false),
        };

        Ok(Entity {
            database,
            table,
            prefix: self.prefix.clone(),
            explicit_database,
        })
    }

    pub fn qualify(&self, entity: &Entity) -> String {
        entity.qualified()
    }
}
