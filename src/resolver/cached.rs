//! Link resolution behind the metadata cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheCategory, CacheError, CacheKey, CacheStore, CacheStoreExt, CacheTtls};
use crate::metadata::NormalizedMetadata;

use super::{Dispatcher, ResolveError};

/// [`Dispatcher`] with a read-through cache of successful resolutions.
///
/// Keys are `link_metadata:<url>`, or `link_metadata:<profile>:<url>` when a
/// resolution is scoped to a profile, so one profile's entries can be dropped
/// with [`CachedResolver::invalidate_profile`]. Errors are never cached. A
/// failing cache backend is logged and bypassed.
#[derive(Clone)]
pub struct CachedResolver {
    dispatcher: Dispatcher,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CachedResolver {
    /// Wraps `dispatcher` with `cache` using the default link-metadata TTL.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            dispatcher,
            cache,
            ttl: CacheTtls::default().for_category(CacheCategory::LinkMetadata),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Cache key for a link, optionally scoped to a profile.
    #[must_use]
    pub fn cache_key(link: &str, profile: Option<&str>) -> CacheKey {
        let link = link.trim();
        match profile {
            Some(profile) => {
                CacheKey::from_parts(CacheCategory::LinkMetadata.as_str(), profile, &[link])
            }
            None => CacheCategory::LinkMetadata.key(link),
        }
    }

    /// Resolves a link, serving a live cached record when there is one.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ResolveError`]; cache failures are not errors.
    pub async fn resolve(&self, link: &str) -> Result<NormalizedMetadata, ResolveError> {
        self.resolve_keyed(link, &Self::cache_key(link, None)).await
    }

    /// Like [`CachedResolver::resolve`], with the cache entry scoped to `profile`.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ResolveError`]; cache failures are not errors.
    pub async fn resolve_for_profile(
        &self,
        profile: &str,
        link: &str,
    ) -> Result<NormalizedMetadata, ResolveError> {
        self.resolve_keyed(link, &Self::cache_key(link, Some(profile)))
            .await
    }

    /// Drops every cached entry whose key mentions `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    pub async fn invalidate_profile(&self, profile: &str) -> Result<usize, CacheError> {
        self.cache.clear_scope(profile).await
    }

    #[tracing::instrument(skip(self, key), fields(key = %key))]
    async fn resolve_keyed(
        &self,
        link: &str,
        key: &CacheKey,
    ) -> Result<NormalizedMetadata, ResolveError> {
        match self.cache.get_json::<NormalizedMetadata>(key.as_str()).await {
            Ok(Some(cached)) => {
                debug!("Cache hit");
                return Ok(cached);
            }
            Ok(None) => debug!("Cache miss"),
            Err(error) => warn!(error = %error, "Cache read failed; resolving uncached"),
        }

        let metadata = self.dispatcher.resolve(link).await?;

        if let Err(error) = self.cache.set_json(key.as_str(), &metadata, self.ttl).await {
            warn!(error = %error, "Cache write failed; result not cached");
        }
        Ok(metadata)
    }
}

impl std::fmt::Debug for CachedResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResolver")
            .field("dispatcher", &self.dispatcher)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
