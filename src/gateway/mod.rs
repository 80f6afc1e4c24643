//! Execution gateway: the single choke point through which every statement reaches the engine.
//!
//! One worker thread owns the `rusqlite::Connection`. Callers enqueue commands on a channel and
//! await a oneshot reply, so statements run one at a time in arrival order. The async surface
//! does not imply write concurrency. Dropping a pending future does not withdraw its command.

mod channel;
mod dispatcher;
mod manager;

use std::fmt;
use std::sync::Arc;

use crate::codec;
use crate::config::DatabaseOptions;
use crate::error::SqlRecordError;
use crate::query_builder::RenderedQuery;
use crate::results::ResultSet;

use manager::Worker;

/// Result of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: usize,
    /// Engine's last-insert rowid after the statement ran. Only meaningful for inserts.
    pub last_insert_id: i64,
}

/// Cloneable handle to the worker-owned connection.
///
/// The connection closes once the last handle is dropped or [`Gateway::close`] succeeds.
#[derive(Clone)]
pub struct Gateway {
    worker: Arc<Worker>,
}

impl Gateway {
    /// Open the database described by `options` on a fresh worker thread.
    ///
    /// # Errors
    /// `ConnectionError` if the thread cannot be spawned, `EngineError` if opening the file or
    /// applying pragmas fails.
    pub async fn open(options: DatabaseOptions) -> Result<Self, SqlRecordError> {
        let worker = Worker::spawn(options).await?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Run raw SQL text, possibly several statements, without parameters.
    ///
    /// # Errors
    /// `EngineError` on any statement failure; `ConnectionError` if the worker is gone.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<(), SqlRecordError> {
        self.worker.execute_batch(sql.into()).await
    }

    /// Run a SELECT and decode all rows.
    ///
    /// # Errors
    /// `EngineError` if the engine rejects the statement, `DecodeError` if a row cannot be
    /// decoded, `ConnectionError` if the worker is gone.
    pub async fn query(&self, rendered: &RenderedQuery) -> Result<ResultSet, SqlRecordError> {
        self.worker
            .execute_select(rendered.sql.clone(), codec::encode_all(&rendered.params))
            .await
    }

    /// Run one INSERT/UPDATE/DELETE.
    ///
    /// # Errors
    /// `EngineError` if the engine rejects the statement, `ConnectionError` if the worker is gone.
    pub async fn execute(&self, rendered: &RenderedQuery) -> Result<ExecOutcome, SqlRecordError> {
        self.worker
            .execute_dml(rendered.sql.clone(), codec::encode_all(&rendered.params))
            .await
    }

    /// Run several statements inside one engine transaction; all apply or none do.
    ///
    /// # Errors
    /// `EngineError` from the first failing statement (the group is rolled back),
    /// `ConnectionError` if the worker is gone.
    pub async fn execute_many(
        &self,
        statements: &[RenderedQuery],
    ) -> Result<Vec<ExecOutcome>, SqlRecordError> {
        let queued = statements
            .iter()
            .map(|r| (r.sql.clone(), codec::encode_all(&r.params)))
            .collect();
        self.worker.execute_many(queued).await
    }

    /// Close the connection now instead of waiting for the last handle to drop.
    ///
    /// # Errors
    /// `EngineError` if the engine refuses to close, `ConnectionError` if already closed.
    pub async fn close(&self) -> Result<(), SqlRecordError> {
        self.worker.close().await
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("worker_id", &self.worker.worker_id())
            .finish()
    }
}
