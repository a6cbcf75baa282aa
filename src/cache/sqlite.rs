//! SQLite cache backend.
//!
//! Each row holds the JSON text of a payload and its absolute expiry in
//! milliseconds. Expired rows are removed lazily on read, exactly like the
//! in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::db::Database;

use super::{CacheEntry, CacheError, CacheStore, Clock, SystemClock};

/// Persistent [`CacheStore`] on top of [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteCacheStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqliteCacheStore {
    /// Creates a store over an open database on the system clock.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates a store over an open database on a custom clock.
    #[must_use]
    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Returns the underlying database.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    #[instrument(skip(self, payload))]
    async fn set(&self, key: &str, payload: Value, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, payload, self.clock.now_millis(), ttl);
        let payload_text = serde_json::to_string(&entry.payload)
            .map_err(|source| CacheError::serialization(key, source))?;

        sqlx::query(
            "INSERT INTO cache_entries (key, payload, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, expires_at = excluded.expires_at",
        )
        .bind(&entry.key)
        .bind(payload_text)
        .bind(entry.expires_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = self.clock.now_millis();
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT payload, expires_at FROM cache_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(self.db.pool())
                .await?;

        let Some((payload_text, expires_at)) = row else {
            return Ok(None);
        };

        if now >= expires_at {
            // Guard on expiry so a concurrent refresh of the same key survives.
            sqlx::query("DELETE FROM cache_entries WHERE key = ? AND expires_at <= ?")
                .bind(key)
                .bind(now)
                .execute(self.db.pool())
                .await?;
            debug!(key, "Evicted expired cache entry");
            return Ok(None);
        }

        serde_json::from_str(&payload_text)
            .map(Some)
            .map_err(|source| CacheError::serialization(key, source))
    }

    #[instrument(skip(self))]
    async fn clear(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_scope(&self, token: &str) -> Result<usize, CacheError> {
        if token.is_empty() {
            return Ok(0);
        }
        // instr() is a case-sensitive substring test, unlike LIKE.
        let result = sqlx::query("DELETE FROM cache_entries WHERE instr(key, ?) > 0")
            .bind(token)
            .execute(self.db.pool())
            .await?;
        let removed = usize::try_from(result.rows_affected()).unwrap_or(usize::MAX);
        debug!(token, removed, "Cleared cache scope");
        Ok(removed)
    }
}
