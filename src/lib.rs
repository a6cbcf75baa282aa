//! Link Metadata Core Library
//!
//! This library turns user-submitted links (Discord invites, GitHub
//! repositories and profiles, YouTube channels, Spotify tracks, Steam
//! profiles) into a uniform card record for profile pages.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`metadata`] - The normalized record every resolution produces
//! - [`resolver`] - Provider adapters, dispatcher and cached resolution
//! - [`fetcher`] - Proxy-chain HTTP fetching for CORS-restricted endpoints
//! - [`cache`] - Time-boxed key-value cache with scoped invalidation
//! - [`db`] - SQLite connection and schema for the persistent cache

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod db;
pub mod fetcher;
pub mod metadata;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use cache::{
    CacheCategory, CacheError, CacheKey, CacheStore, CacheStoreExt, CacheTtls, MemoryCacheStore,
    SqliteCacheStore,
};
pub use db::{Database, DbError};
pub use fetcher::{DEFAULT_PROXY_TEMPLATES, ProxyChain, ProxyTemplate, ResilientFetcher};
pub use metadata::{NormalizedMetadata, ProviderType};
pub use resolver::{
    Adapter, CachedResolver, Dispatcher, HttpSettings, ProviderAdapter, ProviderEndpoints,
    ResolveError, ResolverConfig,
};
