use std::time::Duration;

use crate::database::Database;
use crate::error::SqlRecordError;

/// Options for opening a database.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub db_path: String,
    pub journal_mode_wal: bool,
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            journal_mode_wal: false,
            busy_timeout: Duration::from_secs(5),
            foreign_keys: false,
        }
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(db_path)
    }

    /// Check the options before a worker thread is spawned.
    ///
    /// # Errors
    /// `ConfigError` if the path is empty.
    pub fn validate(&self) -> Result<(), SqlRecordError> {
        if self.db_path.trim().is_empty() {
            return Err(SqlRecordError::ConfigError(
                "database path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`DatabaseOptions`].
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), sql_record::SqlRecordError> {
/// use sql_record::DatabaseOptions;
///
/// let db = DatabaseOptions::builder("app.db")
///     .wal(true)
///     .foreign_keys(true)
///     .build()
///     .await?;
/// # let _ = db;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: DatabaseOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn wal(mut self, enabled: bool) -> Self {
        self.opts.journal_mode_wal = enabled;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Open the database with these options.
    ///
    /// # Errors
    /// Returns `SqlRecordError` if the options are invalid or the connection cannot be opened.
    pub async fn build(self) -> Result<Database, SqlRecordError> {
        Database::open_with(self.finish()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = DatabaseOptions::builder("x.db")
            .wal(true)
            .busy_timeout(Duration::from_millis(250))
            .finish();
        assert!(opts.journal_mode_wal);
        assert!(!opts.foreign_keys);
        assert_eq!(opts.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = DatabaseOptions::new("  ").validate().unwrap_err();
        assert!(matches!(err, SqlRecordError::ConfigError(_)));
    }
}
