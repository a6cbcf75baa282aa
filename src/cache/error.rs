//! Error types for cache store operations.

use thiserror::Error;

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Payload could not be converted to or from JSON
    #[error("cache payload serialization failed for '{key}': {source}")]
    Serialization {
        /// Key being read or written
        key: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// The backing store rejected the operation
    #[error("cache storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CacheError {
    /// Creates a `Serialization` error for `key`.
    #[must_use]
    pub fn serialization(key: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.to_string(),
            source,
        }
    }
}
