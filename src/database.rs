use serde_json::Value as JsonValue;
use tracing::info;

use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
use crate::error::SqlRecordError;
use crate::gateway::Gateway;
use crate::query_builder::RenderedQuery;
use crate::results::ResultSet;
use crate::table::Table;

/// Handle to one database file and its single connection.
///
/// Cloning is cheap; clones, tables and records all share the same connection, which closes when
/// the last of them is dropped or [`Database::close`] is called.
#[derive(Debug, Clone)]
pub struct Database {
    path: String,
    gateway: Gateway,
}

impl Database {
    /// Open `path` with default options, creating the file if needed.
    ///
    /// # Errors
    /// `ConfigError` for an empty path, `EngineError` if the file cannot be opened.
    pub async fn open(path: impl Into<String>) -> Result<Self, SqlRecordError> {
        Self::open_with(DatabaseOptions::new(path)).await
    }

    /// Open with explicit options.
    ///
    /// # Errors
    /// See [`Database::open`].
    pub async fn open_with(options: DatabaseOptions) -> Result<Self, SqlRecordError> {
        options.validate()?;
        let path = options.db_path.clone();
        let gateway = Gateway::open(options).await?;
        Ok(Self { path, gateway })
    }

    #[must_use]
    pub fn builder(path: impl Into<String>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(path)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run raw SQL text, possibly several `;`-separated statements, without parameters.
    ///
    /// # Errors
    /// `EngineError` from the first failing statement. Statements before it stay applied unless the
    /// text wraps them in its own transaction.
    pub async fn execute(&self, sql: &str) -> Result<(), SqlRecordError> {
        self.gateway.execute_batch(sql).await
    }

    /// Run a raw SELECT and return every row.
    ///
    /// # Errors
    /// `EngineError` if the engine rejects the statement.
    pub async fn query(&self, sql: &str) -> Result<ResultSet, SqlRecordError> {
        self.gateway
            .query(&RenderedQuery {
                sql: sql.to_owned(),
                params: Vec::new(),
            })
            .await
    }

    /// Run a raw SELECT and return its rows as a JSON array of objects.
    ///
    /// # Errors
    /// See [`Database::query`].
    pub async fn query_json(&self, sql: &str) -> Result<JsonValue, SqlRecordError> {
        Ok(self.query(sql).await?.to_json())
    }

    /// Table handle for `name`. Nothing is checked against the schema until a query runs.
    #[must_use]
    pub fn table(&self, name: &str) -> Table {
        Table::new(name, self.gateway.clone())
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Close the connection. Every handle sharing it fails with `ConnectionError` afterwards.
    ///
    /// # Errors
    /// `EngineError` if the engine refuses to close, `ConnectionError` if already closed.
    pub async fn close(&self) -> Result<(), SqlRecordError> {
        self.gateway.close().await?;
        info!(path = %self.path, "database closed");
        Ok(())
    }
}
