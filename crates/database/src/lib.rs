//! Fixture orchestrator: runs DSL-described fixtures and assertions against
//! an injected statement executor.
//!
//! Every operation follows the same chain:
//!
//! ```text
//! entity string ─→ EntityResolver ─→ Entity
//! DSL string    ─→ parse + keyword substitution ─→ ColumnMap
//!                    ↓
//!              QueryDirector ─→ Query
//!                    ↓
//!            StatementExecutor ─→ RecordBatch | RawError
//!                    ↓
//!     interpret result, remember keywords, fall back on duplicate keys
//! ```
//!
//! One [`FixtureApi`] owns one session: its keyword store, statement history
//! and last command state. Parallel scenarios each need their own instance.

mod history;

pub use history::{HistoryEntry, SqlHistory};

use catalog::Entity;
use common::{FixtureError, FixtureResult, RecordBatch, RowMap, sql::key_from_duplicate_error};
use compiler::{ClauseCompiler, CommandKind};
use executor::{RawError, StatementExecutor, ensure_rows_affected, execution_error};
use keystore::KeywordStore;
use parser::{ColumnMap, ColumnValue, FixtureTable, parse_and_resolve};
use planner::{Query, QueryDirector};
use serde::Serialize;

/// Result of an INSERT or UPDATE: the statement and the row read back
/// afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WriteOutcome {
    pub sql: String,
    pub row: RowMap,
    /// True when no new row was written because a matching one already
    /// existed.
    pub existing: bool,
}

/// Session-scoped fixture operations over a statement executor.
pub struct FixtureApi<E> {
    executor: E,
    compiler: ClauseCompiler,
    keywords: KeywordStore,
    history: SqlHistory,
    last_kind: Option<CommandKind>,
    last_entity: Option<Entity>,
}

impl<E: StatementExecutor> FixtureApi<E> {
    /// Start a session with an empty keyword store.
    pub fn new(executor: E) -> FixtureResult<Self> {
        Self::with_keywords(executor, KeywordStore::new())
    }

    /// Start a session that continues an existing keyword store.
    pub fn with_keywords(executor: E, keywords: KeywordStore) -> FixtureResult<Self> {
        let compiler = ClauseCompiler::new(executor.config())?;
        Ok(Self {
            executor,
            compiler,
            keywords,
            history: SqlHistory::new(),
            last_kind: None,
            last_entity: None,
        })
    }

    /// Insert a row unless an equal one already exists.
    ///
    /// 1. Probe with a SELECT over the given columns; an existing row is
    ///    returned as is.
    /// 2. INSERT, back-filling NOT NULL columns the DSL omitted.
    /// 3. On a duplicate-key failure, look the conflicting row up by the
    ///    reported key instead of failing.
    /// 4. Remember the new identity and read the row back.
    ///
    /// Afterwards the last command kind is `select`, the verification read.
    pub fn insert(&mut self, entity: &str, columns: &str) -> FixtureResult<WriteOutcome> {
        let entity = self.begin(entity)?;
        let columns = self.resolve(columns)?;

        if !columns.is_empty() {
            let probe = self.build(CommandKind::Select, &entity, &ColumnMap::new(), &columns)?;
            let found = self.run(&probe)?;
            if let Some(row) = found.first_row() {
                tracing::debug!(%entity, "matching row exists; insert skipped");
                self.remember_identity(&entity, &row)?;
                self.keywords.remember_row(entity.table(), &row);
                self.last_kind = Some(CommandKind::Select);
                return Ok(WriteOutcome {
                    sql: probe.into_sql(),
                    row,
                    existing: true,
                });
            }
        }

        let required = self.executor.required_table_columns(&entity)?;
        let insert =
            QueryDirector::new(&self.compiler).build_insert(entity.clone(), &columns, required)?;
        self.last_kind = Some(CommandKind::Insert);

        if let Err(raw) = self.run_raw(&insert) {
            let row = self.duplicate_fallback(&entity, &insert, &raw)?;
            return Ok(WriteOutcome {
                sql: insert.into_sql(),
                row,
                existing: true,
            });
        }

        let id = self.executor.last_insert_id()?;
        self.history.set_last_id(id);
        if id > 0 {
            let primary_key = self.executor.primary_key_for_table(&entity)?;
            self.keywords.remember(entity.table(), id);
            self.keywords
                .remember(format!("{}.{primary_key}", entity.table()), id);
            let criteria = ColumnMap::from_iter([(primary_key, id.to_string())]);
            let (_, row) = self.select_row(&entity, &criteria)?;
            return Ok(WriteOutcome {
                sql: insert.into_sql(),
                row,
                existing: false,
            });
        }

        // No generated identity: read back by the inserted columns.
        let (_, row) = self.select_row(&entity, &columns)?;
        self.remember_identity(&entity, &row)?;
        Ok(WriteOutcome {
            sql: insert.into_sql(),
            row,
            existing: false,
        })
    }

    /// Insert one row per data row of a fixture table.
    pub fn insert_table(&mut self, entity: &str, table: &FixtureTable) -> FixtureResult<Vec<WriteOutcome>> {
        table
            .to_queries()?
            .iter()
            .map(|columns| self.insert(entity, columns))
            .collect()
    }

    /// Update the rows matching `criteria` with the `with` assignments and
    /// read the updated row back.
    ///
    /// The read uses `criteria` with the assigned values laid over it.
    /// Afterwards the last command kind is `select`.
    pub fn update(&mut self, entity: &str, with: &str, criteria: &str) -> FixtureResult<WriteOutcome> {
        let entity = self.begin(entity)?;
        let assignments = self.resolve(with)?;
        let criteria = self.resolve(criteria)?;

        let update = self.build(CommandKind::Update, &entity, &assignments, &criteria)?;
        self.last_kind = Some(CommandKind::Update);
        let batch = self.run(&update)?;
        ensure_rows_affected(&batch, update.sql())?;

        let mut verify = criteria;
        for (column, value) in assignments.iter() {
            if ColumnValue::classify(value) != ColumnValue::NotNull {
                verify.insert(column, value);
            }
        }
        let (_, row) = self.select_row(&entity, &verify)?;
        Ok(WriteOutcome {
            sql: update.into_sql(),
            row,
            existing: false,
        })
    }

    /// Delete the rows matching `criteria`. Returns the executed SQL.
    pub fn delete(&mut self, entity: &str, criteria: &str) -> FixtureResult<String> {
        let entity = self.begin(entity)?;
        let criteria = self.resolve(criteria)?;

        let delete = self.build(CommandKind::Delete, &entity, &ColumnMap::new(), &criteria)?;
        self.last_kind = Some(CommandKind::Delete);
        let batch = self.run(&delete)?;
        ensure_rows_affected(&batch, delete.sql())?;
        Ok(delete.into_sql())
    }

    /// First row matching `criteria`; no match is an error.
    pub fn select(&mut self, entity: &str, criteria: &str) -> FixtureResult<RowMap> {
        let entity = self.begin(entity)?;
        let criteria = self.resolve(criteria)?;
        self.select_row(&entity, &criteria).map(|(_, row)| row)
    }

    /// Number of rows matching `criteria`.
    pub fn count(&mut self, entity: &str, criteria: &str) -> FixtureResult<i64> {
        let entity = self.begin(entity)?;
        let criteria = self.resolve(criteria)?;

        let count = self.build(CommandKind::Count, &entity, &ColumnMap::new(), &criteria)?;
        self.last_kind = Some(CommandKind::Count);
        let batch = self.run(&count)?;
        batch
            .first_value()
            .and_then(|value| value.as_i64())
            .ok_or_else(|| FixtureError::Execution {
                sql: count.sql().to_string(),
                message: "COUNT returned no integer".into(),
            })
    }

    /// Fail with `Select` unless a matching row exists. Returns the SQL.
    pub fn assert_exists(&mut self, entity: &str, with: &str) -> FixtureResult<String> {
        let entity = self.begin(entity)?;
        let criteria = self.resolve(with)?;
        self.select_row(&entity, &criteria).map(|(sql, _)| sql)
    }

    /// Fail with `RowExists` if a matching row exists. Returns the SQL.
    pub fn assert_not_exists(&mut self, entity: &str, with: &str) -> FixtureResult<String> {
        let entity = self.begin(entity)?;
        let criteria = self.resolve(with)?;

        let select = self.build(CommandKind::Select, &entity, &ColumnMap::new(), &criteria)?;
        self.last_kind = Some(CommandKind::Select);
        let batch = self.run(&select)?;
        if batch.has_fetched_rows() {
            return Err(FixtureError::RowExists {
                sql: select.into_sql(),
            });
        }
        Ok(select.into_sql())
    }

    /// Kind of the statement the last operation finished with.
    pub fn last_command_kind(&self) -> Option<CommandKind> {
        self.last_kind
    }

    /// Entity the last operation targeted.
    pub fn entity(&self) -> Option<&Entity> {
        self.last_entity.as_ref()
    }

    pub fn keywords(&self) -> &KeywordStore {
        &self.keywords
    }

    pub fn keywords_mut(&mut self) -> &mut KeywordStore {
        &mut self.keywords
    }

    pub fn history(&self) -> &SqlHistory {
        &self.history
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Forget keywords, history and last command state.
    pub fn reset_session(&mut self) {
        self.keywords.reset();
        self.history.clear();
        self.last_kind = None;
        self.last_entity = None;
    }

    fn begin(&mut self, raw: &str) -> FixtureResult<Entity> {
        let entity = self.compiler.resolver().resolve(raw)?;
        self.last_entity = Some(entity.clone());
        Ok(entity)
    }

    fn resolve(&self, dsl: &str) -> FixtureResult<ColumnMap> {
        parse_and_resolve(dsl, &self.keywords)
    }

    fn build(
        &self,
        kind: CommandKind,
        entity: &Entity,
        columns: &ColumnMap,
        criteria: &ColumnMap,
    ) -> FixtureResult<Query> {
        QueryDirector::new(&self.compiler).build(kind, entity.clone(), columns, criteria)
    }

    fn select_row(&mut self, entity: &Entity, criteria: &ColumnMap) -> FixtureResult<(String, RowMap)> {
        let select = self.build(CommandKind::Select, entity, &ColumnMap::new(), criteria)?;
        self.last_kind = Some(CommandKind::Select);
        let batch = self.run(&select)?;
        let row = batch.first_row().ok_or_else(|| FixtureError::Select {
            sql: select.sql().to_string(),
        })?;
        self.keywords.remember_row(entity.table(), &row);
        Ok((select.into_sql(), row))
    }

    fn duplicate_fallback(
        &mut self,
        entity: &Entity,
        insert: &Query,
        raw: &RawError,
    ) -> FixtureResult<RowMap> {
        let Some(key) = key_from_duplicate_error(raw) else {
            return Err(execution_error(insert.sql(), raw));
        };
        tracing::warn!(
            %entity,
            column = %key.column,
            value = %key.value,
            "duplicate key on insert; using the existing row"
        );

        let criteria = ColumnMap::from_iter([(key.column, key.value)]);
        let (_, row) = self.select_row(entity, &criteria)?;
        self.remember_identity(entity, &row)?;
        Ok(row)
    }

    /// Remember the primary key of a row that was found rather than inserted.
    fn remember_identity(&mut self, entity: &Entity, row: &RowMap) -> FixtureResult<()> {
        let primary_key = self.executor.primary_key_for_table(entity)?;
        if let Some(id) = row.get(&primary_key) {
            self.keywords.remember(entity.table(), id.clone());
        }
        Ok(())
    }

    fn run(&mut self, query: &Query) -> FixtureResult<RecordBatch> {
        self.run_raw(query)
            .map_err(|raw| execution_error(query.sql(), &raw))
    }

    fn run_raw(&mut self, query: &Query) -> Result<RecordBatch, RawError> {
        tracing::debug!(kind = %query.kind(), entity = %query.entity(), sql = query.sql(), "executing");
        let batch = self.executor.execute(query.sql())?;
        self.history
            .record(query.kind(), query.entity().to_string(), query.sql());
        Ok(batch)
    }
}
