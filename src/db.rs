//! SQLite backing for the persistent cache.
//!
//! [`Database`] owns a small connection pool with the `cache_entries` schema
//! applied from `migrations/`. File databases run in WAL mode so concurrent
//! resolutions can read while one writes.
//!
//! # Example
//!
//! ```no_run
//! use linkmeta_core::{Database, SqliteCacheStore};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("linkmeta-cache.db")).await?;
//! let store = SqliteCacheStore::new(db);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, instrument};

/// Pool size for file databases. SQLite serializes writers anyway.
const MAX_FILE_CONNECTIONS: u32 = 4;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors opening or migrating the cache database.
#[derive(Error, Debug)]
pub enum DbError {
    /// The parent directory of the database file could not be created.
    #[error("cannot create cache directory '{path}': {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Connecting or querying failed.
    #[error("cache database error: {0}")]
    Connection(#[from] sqlx::Error),

    /// The schema could not be applied.
    #[error("cache schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Pooled connection to the cache database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the cache database at `db_path`, creating the file and any
    /// missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Directory`] when the parent directory cannot be
    /// created, [`DbError::Connection`] when SQLite refuses the file, and
    /// [`DbError::Migration`] when the schema cannot be applied.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn new(db_path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DbError::Directory {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_FILE_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::migrate(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// The data lives in the pool's only connection, which is never retired.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] or [`DbError::Migration`].
    #[instrument]
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, DbError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("Cache schema ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Reports the active journal mode (`wal`, `memory`, ...), lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the pragma query fails.
    pub async fn journal_mode(&self) -> Result<String, DbError> {
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await?;
        Ok(mode.to_ascii_lowercase())
    }

    /// Closes every pooled connection, flushing the WAL.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
