//! Statement executor seam: the capabilities the fixture core needs from a
//! database driver.
//!
//! The core never opens connections itself. A driver implements
//! [`StatementExecutor`] and hands it to the orchestrator, which calls it
//! synchronously:
//!
//! ```text
//! FixtureApi
//!     ↓ execute(sql)
//! StatementExecutor ──→ Ok(RecordBatch) | Err(RawError)
//!     ↓
//! checked() / ensure_rows_affected()
//!     ↓
//! FixtureResult<RecordBatch>
//! ```

use catalog::Entity;
use common::{Config, Delimiters, FixtureError, FixtureResult, RecordBatch};
use types::SqlType;

pub use common::RawError;

/// A driver able to run SQL text and describe table schemas.
pub trait StatementExecutor {
    /// Run one statement. Reads return their rows; writes return the
    /// affected row count.
    fn execute(&mut self, sql: &str) -> Result<RecordBatch, RawError>;

    /// Identity generated by the most recent successful INSERT.
    fn last_insert_id(&mut self) -> FixtureResult<i64>;

    /// NOT NULL columns without a default, in schema order.
    fn required_table_columns(&mut self, entity: &Entity) -> FixtureResult<Vec<(String, SqlType)>>;

    fn primary_key_for_table(&mut self, _entity: &Entity) -> FixtureResult<String> {
        Ok("id".to_string())
    }

    /// Connection parameters: prefix, default database and schema, engine.
    fn config(&self) -> &Config;

    /// Reserved-word delimiters of the connected engine.
    fn delimiters(&self) -> Delimiters {
        self.config().engine.delimiters()
    }
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for Box<E> {
    fn execute(&mut self, sql: &str) -> Result<RecordBatch, RawError> {
        (**self).execute(sql)
    }

    fn last_insert_id(&mut self) -> FixtureResult<i64> {
        (**self).last_insert_id()
    }

    fn required_table_columns(&mut self, entity: &Entity) -> FixtureResult<Vec<(String, SqlType)>> {
        (**self).required_table_columns(entity)
    }

    fn primary_key_for_table(&mut self, entity: &Entity) -> FixtureResult<String> {
        (**self).primary_key_for_table(entity)
    }

    fn config(&self) -> &Config {
        (**self).config()
    }

    fn delimiters(&self) -> Delimiters {
        (**self).delimiters()
    }
}

/// Convert a raw driver failure into an execution error carrying the SQL.
pub fn execution_error(sql: &str, raw: &RawError) -> FixtureError {
    FixtureError::Execution {
        sql: sql.to_string(),
        message: raw.to_string(),
    }
}

/// Run `sql` and map any driver failure to `FixtureError::Execution`.
pub fn checked<E: StatementExecutor + ?Sized>(executor: &mut E, sql: &str) -> FixtureResult<RecordBatch> {
    executor.execute(sql).map_err(|raw| execution_error(sql, &raw))
}

/// Fail with `NoRowsAffected` when a write changed nothing.
pub fn ensure_rows_affected(batch: &RecordBatch, sql: &str) -> FixtureResult<()> {
    if batch.rows_affected == 0 {
        return Err(FixtureError::NoRowsAffected {
            sql: sql.to_string(),
        });
    }
    Ok(())
}
