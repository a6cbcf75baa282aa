//! Cache key derivation and per-category TTL constants.

use std::fmt;
use std::time::Duration;

/// Delimiter joining the parts of a cache key.
pub const KEY_DELIMITER: char = ':';

/// TTL for live listening activity.
pub const LISTENING_ACTIVITY_TTL: Duration = Duration::from_secs(2 * 60);
/// TTL for profile appearance (theme, layout, avatar).
pub const PROFILE_APPEARANCE_TTL: Duration = Duration::from_secs(30 * 60);
/// TTL for resolved link metadata.
pub const LINK_METADATA_TTL: Duration = Duration::from_secs(60 * 60);

/// Kinds of cached data, each with its own default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Normalized metadata for a resolved link.
    LinkMetadata,
    /// Currently-playing activity, changes within minutes.
    ListeningActivity,
    /// Profile appearance settings, change rarely.
    ProfileAppearance,
}

impl CacheCategory {
    /// Returns the key prefix for this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinkMetadata => "link_metadata",
            Self::ListeningActivity => "listening_activity",
            Self::ProfileAppearance => "profile_appearance",
        }
    }

    /// Derives the key for `identifier` in this category.
    #[must_use]
    pub fn key(self, identifier: &str) -> CacheKey {
        CacheKey::new(self.as_str(), identifier)
    }
}

/// A cache key built as `category:identifier[:part...]`.
///
/// The same parts in the same order always produce the same key. Parts are
/// not escaped; scoped invalidation relies on plain substring matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a key from a category and identifier.
    #[must_use]
    pub fn new(category: &str, identifier: &str) -> Self {
        Self(format!("{category}{KEY_DELIMITER}{identifier}"))
    }

    /// Creates a key from a category, identifier and any extra parts, in order.
    #[must_use]
    pub fn from_parts(category: &str, identifier: &str, extra: &[&str]) -> Self {
        extra
            .iter()
            .fold(Self::new(category, identifier), |key, part| key.with_part(part))
    }

    /// Appends one more part.
    #[must_use]
    pub fn with_part(mut self, part: &str) -> Self {
        self.0.push(KEY_DELIMITER);
        self.0.push_str(part);
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-category TTLs handed to the cache by its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub link_metadata: Duration,
    pub listening_activity: Duration,
    pub profile_appearance: Duration,
}

impl CacheTtls {
    /// Returns the TTL configured for `category`.
    #[must_use]
    pub fn for_category(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::LinkMetadata => self.link_metadata,
            CacheCategory::ListeningActivity => self.listening_activity,
            CacheCategory::ProfileAppearance => self.profile_appearance,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            link_metadata: LINK_METADATA_TTL,
            listening_activity: LISTENING_ACTIVITY_TTL,
            profile_appearance: PROFILE_APPEARANCE_TTL,
        }
    }
}
