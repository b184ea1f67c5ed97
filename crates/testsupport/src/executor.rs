//! Statement executor double that answers from a queue.

use catalog::Entity;
use common::{Config, FixtureResult, RecordBatch};
use executor::{RawError, StatementExecutor};
use std::collections::VecDeque;
use types::SqlType;

/// Replays queued responses in order and records every statement it is
/// given.
///
/// A statement arriving after the queue is empty fails with a `RawError`
/// naming the SQL, so unexpected extra statements show up in test output.
#[derive(Debug)]
pub struct ScriptedExecutor {
    config: Config,
    responses: VecDeque<Result<RecordBatch, RawError>>,
    executed: Vec<String>,
    last_insert_id: i64,
    required: Vec<(String, SqlType)>,
    primary_key: String,
}

impl ScriptedExecutor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            responses: VecDeque::new(),
            executed: Vec::new(),
            last_insert_id: 0,
            required: Vec::new(),
            primary_key: "id".to_string(),
        }
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = id;
        self
    }

    pub fn with_required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (S, SqlType)>,
        S: Into<String>,
    {
        self.required = columns
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .collect();
        self
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Queue a result set.
    pub fn push_rows(&mut self, batch: RecordBatch) -> &mut Self {
        self.responses.push_back(Ok(batch));
        self
    }

    /// Queue a read that finds nothing.
    pub fn push_empty(&mut self) -> &mut Self {
        self.push_rows(RecordBatch::default())
    }

    /// Queue a write reporting `count` affected rows.
    pub fn push_affected(&mut self, count: u64) -> &mut Self {
        self.push_rows(RecordBatch::affected(count))
    }

    pub fn push_error(&mut self, error: RawError) -> &mut Self {
        self.responses.push_back(Err(error));
        self
    }

    /// Every statement received so far, oldest first.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses.len()
    }
}

impl StatementExecutor for ScriptedExecutor {
    fn execute(&mut self, sql: &str) -> Result<RecordBatch, RawError> {
        self.executed.push(sql.to_string());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(RawError::message(format!("no scripted response for: {sql}"))))
    }

    fn last_insert_id(&mut self) -> FixtureResult<i64> {
        Ok(self.last_insert_id)
    }

    fn required_table_columns(&mut self, _entity: &Entity) -> FixtureResult<Vec<(String, SqlType)>> {
        Ok(self.required.clone())
    }

    fn primary_key_for_table(&mut self, _entity: &Entity) -> FixtureResult<String> {
        Ok(self.primary_key.clone())
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
