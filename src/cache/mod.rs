//! Time-boxed key-value cache for resolved metadata and other profile data.
//!
//! This module provides the injected [`CacheStore`] interface and two
//! backends that implement it:
//!
//! - [`MemoryCacheStore`] - process-local map, lost on exit
//! - [`SqliteCacheStore`] - SQLite-backed, survives restarts
//!
//! # Semantics
//!
//! - `set` overwrites any prior entry (last write wins) and stores an absolute
//!   expiry of `now + ttl`.
//! - `get` expires lazily: an entry whose expiry has passed is deleted as a
//!   side effect and reported as absent.
//! - `clear_scope` removes every key that contains the token as a substring.
//!
//! TTLs are always chosen by the caller; see [`CacheTtls`] for the per-category
//! defaults.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use linkmeta_core::cache::{CacheCategory, CacheStore, MemoryCacheStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryCacheStore::new();
//! let key = CacheCategory::LinkMetadata.key("https://github.com/octocat");
//! store
//!     .set(key.as_str(), serde_json::json!({"title": "octocat"}), Duration::from_secs(60))
//!     .await?;
//! assert!(store.get(key.as_str()).await?.is_some());
//! # Ok(())
//! # }
//! ```

mod error;
mod key;
mod memory;
mod sqlite;

pub use error::CacheError;
pub use key::{
    CacheCategory, CacheKey, CacheTtls, KEY_DELIMITER, LINK_METADATA_TTL, LISTENING_ACTIVITY_TTL,
    PROFILE_APPEARANCE_TTL,
};
pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| duration_millis(elapsed))
    }
}

/// Clock that only moves when told to. Used to test expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `start_millis`.
    #[must_use]
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A stored payload with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    /// Expiry in milliseconds since the Unix epoch.
    pub expires_at: i64,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` after `now_millis`.
    #[must_use]
    pub fn new(key: &str, payload: Value, now_millis: i64, ttl: Duration) -> Self {
        Self {
            key: key.to_string(),
            payload,
            expires_at: now_millis.saturating_add(duration_millis(ttl)),
        }
    }

    /// Returns true while the entry may still be served.
    #[must_use]
    pub fn is_live(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at
    }
}

pub(crate) fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Key-value store with per-entry expiry and scoped invalidation.
///
/// # Object Safety
///
/// This trait uses `async_trait` so callers can inject any backend as
/// `Arc<dyn CacheStore>`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stores `payload` under `key` until `ttl` has elapsed, replacing any prior entry.
    async fn set(&self, key: &str, payload: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Returns the live payload for `key`, deleting it first if it has expired.
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Removes the entry for `key`, if any.
    async fn clear(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every entry whose key contains `token`; returns how many were removed.
    ///
    /// An empty token removes nothing.
    async fn clear_scope(&self, token: &str) -> Result<usize, CacheError>;
}

/// Typed helpers over any [`CacheStore`].
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Reads and deserializes the payload stored under `key`.
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| CacheError::serialization(key, source)),
            None => Ok(None),
        }
    }

    /// Serializes `payload` and stores it under `key`.
    async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        payload: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let value =
            serde_json::to_value(payload).map_err(|source| CacheError::serialization(key, source))?;
        self.set(key, value, ttl).await
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_live_until_expiry() {
        let entry = CacheEntry::new("k", Value::Null, 1_000, Duration::from_secs(1));
        assert_eq!(entry.expires_at, 2_000);
        assert!(entry.is_live(1_999));
        assert!(!entry.is_live(2_000));
    }

    #[test]
    fn test_entry_huge_ttl_saturates() {
        let entry = CacheEntry::new("k", Value::Null, 1_000, Duration::MAX);
        assert_eq!(entry.expires_at, i64::MAX);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(10);
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now_millis(), 15);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
