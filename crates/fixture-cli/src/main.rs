use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use common::{
    Config,
    config::ENV_PARAMS_VAR,
    pretty::{self, TableStyleKind},
};
use compiler::{ClauseCompiler, CommandKind};
use keystore::KeywordStore;
use parser::{ColumnValue, parse_and_resolve, parse_to_map};
use planner::{Query, QueryDirector};
use serde::Serialize;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(&args)?;
    tracing::debug!(engine = ?config.engine, prefix = %config.prefix, "config loaded");

    let output = match &args.command {
        Command::Render {
            kind,
            entity,
            with,
            criteria,
            keyword,
        } => {
            let keywords = keyword_store(keyword)?;
            let query = render(&config, kind, entity, with, criteria, &keywords)?;
            format_query(&query, args.format)?
        }
        Command::Explain { dsl } => explain(dsl, args.format, args.style.into())?,
    };
    println!("{output}");
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "sqlfixture")]
#[command(about = "Render the SQL a fixture step would run", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Connection parameters, e.g. `DBENGINE:mysql;DBNAME:abc;DBPREFIX:dev_`
    #[arg(long, global = true)]
    params: Option<String>,
    /// JSON config file, used when no parameters are given
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format (text or json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    /// Style used for table rendering
    #[arg(long, value_enum, default_value_t = CliTableStyle::Modern, global = true)]
    style: CliTableStyle,
    /// Log rendering steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the statement for a fixture step without executing it
    Render {
        /// select, insert, update, delete or count
        kind: String,
        /// `table` or `database.table`
        entity: String,
        /// Columns to insert or assign
        #[arg(long, default_value = "")]
        with: String,
        /// Predicate columns
        #[arg(long = "where", default_value = "")]
        criteria: String,
        /// Keyword available to `{name}` references, as `name=value`
        #[arg(short, long)]
        keyword: Vec<String>,
    },
    /// Show how a DSL string is tokenized
    Explain { dsl: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliTableStyle {
    Modern,
    Ascii,
    Plain,
}

impl From<CliTableStyle> for TableStyleKind {
    fn from(value: CliTableStyle) -> Self {
        match value {
            CliTableStyle::Modern => TableStyleKind::Modern,
            CliTableStyle::Ascii => TableStyleKind::Ascii,
            CliTableStyle::Plain => TableStyleKind::Plain,
        }
    }
}

/// `--params`, then `--config`, then the environment, then defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(params) = &args.params {
        return Config::from_env_params(params).context("invalid --params");
    }
    if let Some(path) = &args.config {
        return Config::load(path)
            .with_context(|| format!("failed to read config at {}", path.display()));
    }
    match std::env::var(ENV_PARAMS_VAR) {
        Ok(params) => Config::from_env_params(&params)
            .with_context(|| format!("invalid {ENV_PARAMS_VAR}")),
        Err(_) => Ok(Config::default()),
    }
}

fn keyword_store(pairs: &[String]) -> Result<KeywordStore> {
    let mut store = KeywordStore::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("keyword '{pair}' is not name=value");
        };
        store.remember(name.trim(), value.trim());
    }
    Ok(store)
}

fn render(
    config: &Config,
    kind: &str,
    entity: &str,
    with: &str,
    criteria: &str,
    keywords: &KeywordStore,
) -> Result<Query> {
    let kind: CommandKind = kind.parse()?;
    let compiler = ClauseCompiler::new(config)?;
    let entity = compiler.resolver().resolve(entity)?;
    let columns = parse_and_resolve(with, keywords)?;
    let criteria = parse_and_resolve(criteria, keywords)?;

    let director = QueryDirector::new(&compiler);
    let query = match kind {
        CommandKind::Insert => director.build_insert(entity, &columns, Vec::new())?,
        _ => director.build(kind, entity, &columns, &criteria)?,
    };
    Ok(query)
}

fn format_query(query: &Query, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(query.sql().to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(query)?),
    }
}

#[derive(Serialize)]
struct Token<'a> {
    column: &'a str,
    value: &'a str,
    token: &'static str,
}

const EXPLAIN_HEADERS: [&str; 3] = ["Column", "Value", "Token"];

fn explain(dsl: &str, format: OutputFormat, style: TableStyleKind) -> Result<String> {
    let map = parse_to_map(dsl)?;
    let tokens: Vec<Token<'_>> = map
        .iter()
        .map(|(column, value)| Token {
            column,
            value,
            token: ColumnValue::classify(value).kind_name(),
        })
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&tokens)?),
        OutputFormat::Text => {
            let rows = tokens
                .iter()
                .map(|t| vec![t.column.to_string(), t.value.to_string(), t.token.to_string()])
                .collect();
            Ok(pretty::render_string_table(&EXPLAIN_HEADERS, rows, style))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dev() -> Config {
        Config::from_env_params("DBENGINE:mysql;DBSCHEMA:;DBNAME:abc;DBPREFIX:dev_").unwrap()
    }

    fn sql(kind: &str, entity: &str, with: &str, criteria: &str) -> String {
        render(&dev(), kind, entity, with, criteria, &KeywordStore::new())
            .unwrap()
            .into_sql()
    }

    #[test]
    fn renders_each_kind() {
        assert_eq!(
            sql("insert", "database.unique1", "column1:abc", ""),
            "INSERT INTO dev_database.unique1 (`column1`) VALUES ('abc')"
        );
        assert_eq!(
            sql("update", "user", "name:Bob", "id:5"),
            "UPDATE dev_user SET `name` = 'Bob' WHERE `id` = 5"
        );
        assert_eq!(
            sql("delete", "user", "", "id:5"),
            "DELETE FROM dev_user WHERE `id` = 5"
        );
        assert_eq!(
            sql("COUNT", "user", "", ""),
            "SELECT COUNT(*) AS SELECT_COUNT_user FROM dev_user"
        );
        assert_eq!(
            sql("select", "user", "", "email:%@hotmail.com"),
            "SELECT * FROM dev_user WHERE `email` LIKE '%@hotmail.com'"
        );
    }

    #[test]
    fn refuses_unscoped_writes_and_unknown_kinds() {
        let err = render(&dev(), "delete", "user", "", "", &KeywordStore::new()).unwrap_err();
        assert!(err.to_string().contains("requires a WHERE clause"));

        let err = render(&dev(), "merge", "user", "", "id:1", &KeywordStore::new()).unwrap_err();
        assert_eq!(err.to_string(), "unknown command kind 'merge'");
    }

    #[test]
    fn keywords_from_the_command_line() {
        let keywords = keyword_store(&["user.id=42".into(), "name = Abdul".into()]).unwrap();
        let query = render(&dev(), "select", "post", "", "owner_id:{user.id},by:{name}", &keywords)
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM dev_post WHERE `owner_id` = 42 AND `by` = 'Abdul'"
        );

        assert!(keyword_store(&["broken".into()]).is_err());
    }

    #[test]
    fn json_output_carries_the_query() {
        let query = render(&dev(), "delete", "user", "", "id:5", &KeywordStore::new()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&format_query(&query, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["kind"], "delete");
        assert_eq!(json["sql"], "DELETE FROM dev_user WHERE `id` = 5");
    }

    #[test]
    fn explain_classifies_tokens() {
        let output = explain(
            "a:NULL,b:!null,c:%x%,d:{user.id},e:[user.id|name:Bob],f:plain",
            OutputFormat::Json,
            TableStyleKind::Plain,
        )
        .unwrap();
        let tokens: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        let kinds: Vec<&str> = tokens.iter().filter_map(|t| t["token"].as_str()).collect();
        assert_eq!(
            kinds,
            ["Null", "NotNull", "Like", "KeywordRef", "ExternalRef", "Literal"]
        );

        let table = explain("id:5", OutputFormat::Text, TableStyleKind::Ascii).unwrap();
        assert!(table.contains("Token"));
        assert!(table.contains("Literal"));
    }

    #[test]
    fn params_take_precedence_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        Config::builder()
            .prefix("file_")
            .build()
            .save(&path)
            .unwrap();

        let args = Args::parse_from([
            "sqlfixture",
            "--config",
            path.to_str().unwrap(),
            "explain",
            "a:1",
        ]);
        assert_eq!(load_config(&args).unwrap().prefix, "file_");

        let args = Args::parse_from([
            "sqlfixture",
            "--params",
            "DBPREFIX:cli_",
            "--config",
            path.to_str().unwrap(),
            "explain",
            "a:1",
        ]);
        assert_eq!(load_config(&args).unwrap().prefix, "cli_");
    }

    #[test]
    fn render_arguments_parse() {
        let args = Args::parse_from([
            "sqlfixture",
            "render",
            "update",
            "user",
            "--with",
            "name:Bob",
            "--where",
            "id:{user.id}",
            "-k",
            "user.id=3",
            "--format",
            "json",
        ]);
        assert_eq!(args.format, OutputFormat::Json);
        match args.command {
            Command::Render {
                kind,
                criteria,
                keyword,
                ..
            } => {
                assert_eq!(kind, "update");
                assert_eq!(criteria, "id:{user.id}");
                assert_eq!(keyword, vec!["user.id=3"]);
            }
            Command::Explain { .. } => panic!("expected render"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
