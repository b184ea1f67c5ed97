//! Connection parameters the fixture core needs: engine dialect, name
//! prefix, default database and the values that must never be quoted.

use crate::{FixtureError, FixtureResult};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

/// Environment variable holding the connection parameter string.
pub const ENV_PARAMS_VAR: &str = "BEHAT_ENV_PARAMS";

/// Database engine the generated SQL targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Mysql,
    Pgsql,
    Sqlite,
    Mssql,
}

/// Characters wrapping a reserved-word identifier, e.g. `` `order` ``.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiters {
    pub left: char,
    pub right: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            left: '`',
            right: '`',
        }
    }
}

impl Engine {
    pub fn delimiters(self) -> Delimiters {
        match self {
            Engine::Mysql | Engine::Sqlite => Delimiters::default(),
            Engine::Pgsql => Delimiters {
                left: '"',
                right: '"',
            },
            Engine::Mssql => Delimiters {
                left: '[',
                right: ']',
            },
        }
    }

    /// MySQL escapes quotes inside string literals with a backslash; the
    /// others double the quote.
    pub fn backslash_escapes(self) -> bool {
        matches!(self, Engine::Mysql)
    }
}

impl FromStr for Engine {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Engine::Mysql),
            "pgsql" | "postgres" | "postgresql" => Ok(Engine::Pgsql),
            "sqlite" => Ok(Engine::Sqlite),
            "mssql" | "sqlsrv" | "dblib" => Ok(Engine::Mssql),
            other => Err(FixtureError::Config(format!("unsupported engine '{other}'"))),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Engine::Mysql => "mysql",
            Engine::Pgsql => "pgsql",
            Engine::Sqlite => "sqlite",
            Engine::Mssql => "mssql",
        })
    }
}

/// Runtime configuration for the fixture core.
///
/// # Example
/// ```
/// use common::{Config, Engine};
///
/// let config = Config::builder()
///     .engine(Engine::Mysql)
///     .prefix("dev_")
///     .database("mydb")
///     .build();
/// assert_eq!(config.prefix, "dev_");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct Config {
    /// Engine whose identifier and string quoting rules are used.
    #[builder(default)]
    pub engine: Engine,
    /// Prepended to every qualified entity name (e.g. `dev_`).
    #[builder(default, into)]
    pub prefix: String,
    /// Database used when an entity names only a table.
    #[builder(default, into)]
    pub database: String,
    #[builder(into)]
    pub schema: Option<String>,
    /// Regex patterns for values emitted without quotes (matched whole, case-insensitive).
    #[builder(default = default_not_quotable())]
    pub not_quotable: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            prefix: String::new(),
            database: String::new(),
            schema: None,
            not_quotable: default_not_quotable(),
        }
    }
}

fn default_not_quotable() -> Vec<String> {
    [
        "true",
        "false",
        r"NOW\(\)",
        "CURRENT_TIMESTAMP",
        r"COUNT\(.*\)",
        r"MAX\(.*\)",
        r"MIN\(.*\)",
        r"DATE\(.*\)",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    pub fn delimiters(&self) -> Delimiters {
        self.engine.delimiters()
    }

    /// Parse the `KEY:VALUE;KEY:VALUE` connection parameter string, e.g.
    /// `DBENGINE:mysql;DBSCHEMA:;DBNAME:abc;DBHOST:localhost;DBPREFIX:dev_`.
    ///
    /// A leading `BEHAT_ENV_PARAMS=` is tolerated. Host and credential keys
    /// belong to the driver and are ignored here.
    pub fn from_env_params(params: &str) -> FixtureResult<Self> {
        let params = params
            .trim()
            .strip_prefix(ENV_PARAMS_VAR)
            .and_then(|rest| rest.strip_prefix('='))
            .unwrap_or(params.trim());

        let mut config = Config::default();
        for entry in params.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry.split_once(':').ok_or_else(|| {
                FixtureError::Config(format!("parameter '{entry}' is not KEY:VALUE"))
            })?;
            let value = value.trim();
            match key.trim().to_ascii_uppercase().as_str() {
                "DBENGINE" => config.engine = value.parse()?,
                "DBPREFIX" => config.prefix = value.to_string(),
                "DBNAME" => config.database = value.to_string(),
                "DBSCHEMA" => {
                    config.schema = (!value.is_empty()).then(|| value.to_string());
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Read the parameter string from `BEHAT_ENV_PARAMS`.
    pub fn from_env() -> FixtureResult<Self> {
        let params = std::env::var(ENV_PARAMS_VAR)
            .map_err(|_| FixtureError::Config(format!("{ENV_PARAMS_VAR} is not set")))?;
        Self::from_env_params(&params)
    }

    /// Load a config from JSON, returning the default config if the file does not exist.
    pub fn load(path: &Path) -> FixtureResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|err| FixtureError::Config(format!("invalid config file: {err}")))
    }

    /// Persist the config as pretty JSON.
    pub fn save(&self, path: &Path) -> FixtureResult<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| FixtureError::Config(format!("serialize failed: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}
