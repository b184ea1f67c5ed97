//! Clause compiler: renders a column map into SQL predicate or assignment
//! text for a given command kind.
//!
//! Compilation is pure. The same `(kind, glue, map)` always yields the same
//! text, terms appear in input order, and column identifiers are wrapped in
//! the engine's reserved-word delimiters.

mod kind;

pub use kind::{CommandKind, Glue};

use catalog::EntityResolver;
use common::{
    Config, Delimiters, FixtureError, FixtureResult,
    sql::{Quoter, make_sql_safe, sample_data},
};
use parser::{ColumnMap, ColumnValue, ExternalRef, parse_to_map};
use serde::Serialize;
use std::fmt;
use types::SqlType;

/// Relation between a column and its rendered value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Operator {
    Eq,
    IsNull,
    IsNotNull,
    Like,
}

/// One compiled `column operator value` triple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Term {
    pub column: String,
    pub operator: Operator,
    pub value: String,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Eq => write!(f, "{} = {}", self.column, self.value),
            Operator::IsNull => write!(f, "{} is NULL", self.column),
            Operator::IsNotNull => write!(f, "{} is not NULL", self.column),
            Operator::Like => write!(f, "{} LIKE {}", self.column, self.value),
        }
    }
}

/// Ordered terms plus the glue joining them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompiledClause {
    pub terms: Vec<Term>,
    pub glue: Glue,
}

impl CompiledClause {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for CompiledClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, term) in self.terms.iter().enumerate() {
            if idx > 0 {
                f.write_str(self.glue.as_str())?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Column and value lists of an INSERT, both already rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InsertColumns {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl InsertColumns {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns_sql(&self) -> String {
        self.columns.join(", ")
    }

    pub fn values_sql(&self) -> String {
        self.values.join(", ")
    }
}

/// Renders column maps for one engine configuration.
#[derive(Clone, Debug)]
pub struct ClauseCompiler {
    quoter: Quoter,
    delimiters: Delimiters,
    resolver: EntityResolver,
}

impl ClauseCompiler {
    pub fn new(config: &Config) -> FixtureResult<Self> {
        Ok(Self {
            quoter: Quoter::new(config)?,
            delimiters: config.delimiters(),
            resolver: EntityResolver::new(config),
        })
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    pub fn quoter(&self) -> &Quoter {
        &self.quoter
    }

    /// Wrap a column identifier, leaving an already-wrapped one alone.
    pub fn wrap_column(&self, column: &str) -> String {
        make_sql_safe(column, self.delimiters)
    }

    /// Render `map` into clause text joined by `glue`.
    pub fn compile(&self, kind: CommandKind, glue: Glue, map: &ColumnMap) -> FixtureResult<String> {
        Ok(self.compile_clause(kind, glue, map)?.to_string())
    }

    /// Render `map` into ordered terms.
    ///
    /// `NULL` is `is NULL` in predicates and `= NULL` in UPDATE assignments.
    /// `!NULL` is `is not NULL` in predicates and is dropped from UPDATE
    /// assignments. Values containing `%` become `LIKE` patterns whatever
    /// the kind. Keyword references must be resolved beforehand.
    pub fn compile_clause(
        &self,
        kind: CommandKind,
        glue: Glue,
        map: &ColumnMap,
    ) -> FixtureResult<CompiledClause> {
        let assigning = kind == CommandKind::Update && glue == Glue::Comma;
        let mut terms = Vec::with_capacity(map.len());

        for (column, raw) in map.iter() {
            let column = self.wrap_column(column);
            let term = match ColumnValue::classify(raw) {
                ColumnValue::Null if assigning => Term {
                    column,
                    operator: Operator::Eq,
                    value: "NULL".into(),
                },
                ColumnValue::Null => Term {
                    column,
                    operator: Operator::IsNull,
                    value: "NULL".into(),
                },
                ColumnValue::NotNull if assigning => {
                    tracing::warn!(%column, "!NULL cannot be assigned; column left out of SET");
                    continue;
                }
                ColumnValue::NotNull => Term {
                    column,
                    operator: Operator::IsNotNull,
                    value: "NULL".into(),
                },
                ColumnValue::Like(pattern) if assigning => Term {
                    column,
                    operator: Operator::Eq,
                    value: self.quoter.quote(&pattern),
                },
                ColumnValue::Like(pattern) => Term {
                    column,
                    operator: Operator::Like,
                    value: self.quoter.quote(&pattern),
                },
                ColumnValue::Literal(value) => Term {
                    column,
                    operator: Operator::Eq,
                    value: self.quoter.quote_or_not(&value),
                },
                ColumnValue::ExternalRef(reference) => Term {
                    column,
                    operator: Operator::Eq,
                    value: self.subquery(&reference)?,
                },
                ColumnValue::KeywordRef(name) => return Err(FixtureError::UnknownKeyword(name)),
            };
            terms.push(term);
        }

        Ok(CompiledClause { terms, glue })
    }

    /// Render one value for an INSERT value list.
    pub fn render_value(&self, raw: &str) -> FixtureResult<String> {
        match ColumnValue::classify(raw) {
            ColumnValue::Null => Ok("NULL".into()),
            ColumnValue::NotNull => Err(FixtureError::malformed(
                raw,
                "!NULL is a predicate and cannot be inserted",
            )),
            ColumnValue::Like(value) => Ok(self.quoter.quote(&value)),
            ColumnValue::Literal(value) => Ok(self.quoter.quote_or_not(&value)),
            ColumnValue::ExternalRef(reference) => self.subquery(&reference),
            ColumnValue::KeywordRef(name) => Err(FixtureError::UnknownKeyword(name)),
        }
    }

    /// Build INSERT column and value lists.
    ///
    /// Required columns come first in schema order, taking the user's value
    /// when one was given and a sample value for their declared type
    /// otherwise. The remaining user columns follow in input order.
    pub fn fill_required_columns(
        &self,
        map: &ColumnMap,
        required: &[(String, SqlType)],
    ) -> FixtureResult<InsertColumns> {
        let mut out = InsertColumns::default();

        for (column, ty) in required {
            let value = match map.get(column) {
                Some(raw) => self.render_value(raw)?,
                None => sample_data(*ty),
            };
            out.columns.push(self.wrap_column(column));
            out.values.push(value);
        }

        for (column, raw) in map.iter() {
            if required.iter().any(|(name, _)| name == column) {
                continue;
            }
            out.columns.push(self.wrap_column(column));
            out.values.push(self.render_value(raw)?);
        }

        Ok(out)
    }

    fn subquery(&self, reference: &ExternalRef) -> FixtureResult<String> {
        let entity = self.resolver.resolve(&reference.entity)?;
        let criteria = parse_to_map(&reference.criteria)?;
        let column = self.wrap_column(&reference.column);
        if criteria.is_empty() {
            return Ok(format!("(SELECT {column} FROM {})", entity.qualified()));
        }
        let predicate = self.compile(CommandKind::Select, Glue::And, &criteria)?;
        Ok(format!(
            "(SELECT {column} FROM {} WHERE {predicate})",
            entity.qualified()
        ))
    }
}
