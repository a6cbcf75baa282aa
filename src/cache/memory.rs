//! In-memory cache backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::{CacheEntry, CacheError, CacheStore, Clock, SystemClock};

/// Process-local [`CacheStore`] backed by a concurrent map.
///
/// Writes to distinct keys never contend; concurrent writes to the same key
/// resolve last-write-wins.
#[derive(Debug)]
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheStore {
    /// Creates an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store on a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn set(&self, key: &str, payload: Value, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, payload, self.clock.now_millis(), ttl);
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = self.clock.now_millis();
        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.payload.clone())),
            Some(_) => {}
        }

        // The read guard is released above; a concurrent `set` may have
        // refreshed the entry since, so only remove it if still expired.
        if self
            .entries
            .remove_if(key, |_, entry| !entry.is_live(now))
            .is_some()
        {
            debug!(key, "Evicted expired cache entry");
        }
        Ok(None)
    }

    async fn clear(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear_scope(&self, token: &str) -> Result<usize, CacheError> {
        if token.is_empty() {
            return Ok(0);
        }
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !key.contains(token);
            if !keep {
                removed += 1;
            }
            keep
        });
        debug!(token, removed, "Cleared cache scope");
        Ok(removed)
    }
}
