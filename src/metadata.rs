//! Normalized metadata record shared by every provider adapter.
//!
//! Each adapter turns its upstream response into a [`NormalizedMetadata`].
//! Presentation code reads the common fields; provider-specific values
//! (counts, ids, embed markup) travel in [`NormalizedMetadata::extra`] in
//! insertion order.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description used for links that no provider recognizes.
pub const GENERIC_LINK_DESCRIPTION: &str = "External Link";

/// Platform a resolved link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Discord community invites.
    Discord,
    /// GitHub repositories and profiles.
    Github,
    /// YouTube channels.
    Youtube,
    /// Spotify tracks.
    Spotify,
    /// Steam community profiles.
    Steam,
    /// Any link no provider recognizes.
    Other,
}

impl ProviderType {
    /// Returns the stable lowercase tag for this provider.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Github => "github",
            Self::Youtube => "youtube",
            Self::Spotify => "spotify",
            Self::Steam => "steam",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-independent description of a resolved link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    /// Which provider produced this record.
    pub provider_type: ProviderType,
    /// Primary display title.
    pub title: String,
    /// Secondary display text.
    pub description: Option<String>,
    /// Avatar, icon or artwork URL.
    pub image_url: Option<String>,
    /// Finer classification within the provider (e.g. `repository`, `user`).
    pub account_subtype: Option<String>,
    /// Provider-specific presentation fields.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl NormalizedMetadata {
    /// Creates a record with only a provider and title set.
    #[must_use]
    pub fn new(provider_type: ProviderType, title: impl Into<String>) -> Self {
        Self {
            provider_type,
            title: title.into(),
            description: None,
            image_url: None,
            account_subtype: None,
            extra: Map::new(),
        }
    }

    /// Builds the passthrough record for a link no provider recognizes.
    #[must_use]
    pub fn generic_link(url: &str) -> Self {
        Self::new(ProviderType::Other, url).with_description(GENERIC_LINK_DESCRIPTION)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the description only when one is present and non-blank.
    #[must_use]
    pub fn with_optional_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|value| !value.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|value| !value.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_account_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.account_subtype = Some(subtype.into());
        self
    }

    /// Appends a provider-specific field, keeping insertion order.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}
