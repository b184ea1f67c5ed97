//! Query pipeline: assembles resolver and compiler output into a finished,
//! kind-tagged [`Query`].
//!
//! The pipeline has three stages that must run in order:
//!
//! ```text
//! QueryBuilder<Pending>
//!     ↓ build_query   (compile clauses, enforce the WHERE safety rail)
//! QueryBuilder<Built>
//!     ↓ infer_type    (classify the shape, render the SQL template)
//! QueryBuilder<Typed>
//!     ↓ get_result
//! Query               (immutable)
//! ```
//!
//! Each stage consumes the builder, so calling a stage twice or out of order
//! does not compile. [`QueryDirector`] runs all three for the common case.
//!
//! # Example
//!
//! ```
//! use catalog::EntityResolver;
//! use common::Config;
//! use compiler::{ClauseCompiler, CommandKind};
//! use parser::parse_to_map;
//! use planner::QueryDirector;
//!
//! let config = Config::builder().prefix("dev_").build();
//! let compiler = ClauseCompiler::new(&config).unwrap();
//! let entity = EntityResolver::new(&config).resolve("db.user").unwrap();
//! let query = QueryDirector::new(&compiler)
//!     .build(CommandKind::Select, entity, &Default::default(), &parse_to_map("id:5").unwrap())
//!     .unwrap();
//! assert_eq!(query.sql(), "SELECT * FROM dev_db.user WHERE `id` = 5");
//! ```


use catalog::Entity;
use common::{FixtureError, FixtureResult};
use compiler::{ClauseCompiler, CommandKind, CompiledClause, Glue, InsertColumns};
use parser::ColumnMap;
use serde::Serialize;
use std::fmt;
use types::SqlType;

/// A finished statement. Only the pipeline constructs one, and it is never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Query {
    kind: CommandKind,
    entity: Entity,
    columns: ColumnMap,
    criteria: ColumnMap,
    sql: String,
}

impl Query {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Columns written by an INSERT or assigned by an UPDATE.
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Columns of the WHERE predicate.
    pub fn criteria(&self) -> &ColumnMap {
        &self.criteria
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Inputs gathered before the first stage runs.
#[derive(Debug)]
pub struct Pending {
    kind: CommandKind,
    entity: Entity,
    columns: ColumnMap,
    criteria: ColumnMap,
    required: Vec<(String, SqlType)>,
    allow_full_table: bool,
}

/// Compiled but untyped intermediate representation.
#[derive(Debug)]
pub struct Built {
    requested: CommandKind,
    entity: Entity,
    columns: ColumnMap,
    criteria: ColumnMap,
    values: Option<InsertColumns>,
    assignments: Option<CompiledClause>,
    predicate: CompiledClause,
}

/// Kind inferred and SQL rendered.
#[derive(Debug)]
pub struct Typed {
    query: Query,
}

/// Staged builder. The type parameter is the stage the builder is in.
pub struct QueryBuilder<'c, S> {
    compiler: &'c ClauseCompiler,
    state: S,
}

impl<'c> QueryBuilder<'c, Pending> {
    pub fn new(compiler: &'c ClauseCompiler, kind: CommandKind, entity: Entity) -> Self {
        Self {
            compiler,
            state: Pending {
                kind,
                entity,
                columns: ColumnMap::new(),
                criteria: ColumnMap::new(),
                required: Vec::new(),
                allow_full_table: false,
            },
        }
    }

    /// INSERT values or UPDATE assignments.
    pub fn columns(mut self, columns: ColumnMap) -> Self {
        self.state.columns = columns;
        self
    }

    /// WHERE predicate columns.
    pub fn criteria(mut self, criteria: ColumnMap) -> Self {
        self.state.criteria = criteria;
        self
    }

    /// NOT NULL columns of the target table, in schema order. Only INSERT
    /// uses them.
    pub fn required_columns(mut self, required: Vec<(String, SqlType)>) -> Self {
        self.state.required = required;
        self
    }

    /// Let UPDATE and DELETE run without a predicate.
    pub fn allow_full_table(mut self, allow: bool) -> Self {
        self.state.allow_full_table = allow;
        self
    }

    /// Stage 1: compile every clause the requested kind needs.
    ///
    /// # Errors
    ///
    /// - `NoWhereClause` for UPDATE/DELETE without predicate columns, unless
    ///   whole-table operations were allowed.
    /// - `MissingClause` for INSERT without columns or UPDATE without
    ///   assignments.
    /// - Any compilation error of the clauses themselves.
    pub fn build_query(self) -> FixtureResult<QueryBuilder<'c, Built>> {
        let Pending {
            kind,
            entity,
            columns,
            criteria,
            required,
            allow_full_table,
        } = self.state;
        let compiler = self.compiler;

        if matches!(kind, CommandKind::Update | CommandKind::Delete)
            && criteria.is_empty()
            && !allow_full_table
        {
            return Err(FixtureError::NoWhereClause {
                kind: kind.to_string(),
            });
        }

        let values = match kind {
            CommandKind::Insert => {
                let values = compiler.fill_required_columns(&columns, &required)?;
                if values.is_empty() {
                    return Err(missing(kind, "VALUES"));
                }
                Some(values)
            }
            _ => None,
        };

        let assignments = match kind {
            CommandKind::Update => {
                let set = compiler.compile_clause(kind, Glue::Comma, &columns)?;
                if set.is_empty() {
                    return Err(missing(kind, "SET"));
                }
                Some(set)
            }
            _ => None,
        };

        let predicate = match kind {
            CommandKind::Insert => CompiledClause {
                terms: Vec::new(),
                glue: Glue::And,
            },
            _ => compiler.compile_clause(kind, Glue::And, &criteria)?,
        };

        Ok(QueryBuilder {
            compiler,
            state: Built {
                requested: kind,
                entity,
                columns,
                criteria,
                values,
                assignments,
                predicate,
            },
        })
    }
}

impl<'c> QueryBuilder<'c, Built> {
    /// Stage 2: classify the compiled shape and render the SQL.
    ///
    /// A VALUES list means INSERT and a SET list means UPDATE. A bare
    /// predicate fits SELECT, COUNT or DELETE. The shape must agree with the
    /// requested kind.
    pub fn infer_type(self) -> FixtureResult<QueryBuilder<'c, Typed>> {
        let Built {
            requested,
            entity,
            columns,
            criteria,
            values,
            assignments,
            predicate,
        } = self.state;

        let inferred = match (&values, &assignments) {
            (Some(_), None) => CommandKind::Insert,
            (None, Some(_)) => CommandKind::Update,
            (None, None) if !requested.is_write() || requested == CommandKind::Delete => requested,
            _ => {
                return Err(FixtureError::InvalidPipelineState(format!(
                    "cannot infer a {requested} statement from the compiled clauses"
                )));
            }
        };
        if inferred != requested {
            return Err(FixtureError::InvalidPipelineState(format!(
                "requested {requested} but the compiled clauses describe {inferred}"
            )));
        }

        let target = entity.qualified();
        let filter = if predicate.is_empty() {
            String::new()
        } else {
            format!(" WHERE {predicate}")
        };
        let sql = match (inferred, values, assignments) {
            (CommandKind::Insert, Some(values), _) => format!(
                "INSERT INTO {target} ({}) VALUES ({})",
                values.columns_sql(),
                values.values_sql()
            ),
            (CommandKind::Update, _, Some(set)) => format!("UPDATE {target} SET {set}{filter}"),
            (CommandKind::Delete, ..) => format!("DELETE FROM {target}{filter}"),
            (CommandKind::Count, ..) => format!(
                "SELECT COUNT(*) AS SELECT_COUNT_{} FROM {target}{filter}",
                entity.table()
            ),
            _ => format!("SELECT * FROM {target}{filter}"),
        };
        tracing::trace!(kind = %inferred, %entity, %sql, "rendered query");

        Ok(QueryBuilder {
            compiler: self.compiler,
            state: Typed {
                query: Query {
                    kind: inferred,
                    entity,
                    columns,
                    criteria,
                    sql,
                },
            },
        })
    }
}

impl QueryBuilder<'_, Typed> {
    /// Stage 3: release the finished query.
    pub fn get_result(self) -> Query {
        self.state.query
    }
}

fn missing(kind: CommandKind, clause: &str) -> FixtureError {
    FixtureError::MissingClause {
        kind: kind.to_string(),
        clause: clause.to_string(),
    }
}

/// Runs the three pipeline stages in order.
#[derive(Clone, Copy)]
pub struct QueryDirector<'c> {
    compiler: &'c ClauseCompiler,
}

impl<'c> QueryDirector<'c> {
    pub fn new(compiler: &'c ClauseCompiler) -> Self {
        Self { compiler }
    }

    /// Build a query from already keyword-resolved maps.
    pub fn build(
        &self,
        kind: CommandKind,
        entity: Entity,
        columns: &ColumnMap,
        criteria: &ColumnMap,
    ) -> FixtureResult<Query> {
        self.builder(kind, entity, columns, criteria)
            .build_query()?
            .infer_type()
            .map(QueryBuilder::get_result)
    }

    /// Build an INSERT whose required columns are back-filled.
    pub fn build_insert(
        &self,
        entity: Entity,
        columns: &ColumnMap,
        required: Vec<(String, SqlType)>,
    ) -> FixtureResult<Query> {
        self.builder(CommandKind::Insert, entity, columns, &ColumnMap::new())
            .required_columns(required)
            .build_query()?
            .infer_type()
            .map(QueryBuilder::get_result)
    }

    fn builder(
        &self,
        kind: CommandKind,
        entity: Entity,
        columns: &ColumnMap,
        criteria: &ColumnMap,
    ) -> QueryBuilder<'c, Pending> {
        QueryBuilder::new(self.compiler, kind, entity)
            .columns(columns.clone())
            .criteria(criteria.clone())
    }
}
