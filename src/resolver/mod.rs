//! Provider adapters that turn a link into [`NormalizedMetadata`].
//!
//! Each supported platform has one adapter. Adapters share a single contract,
//! [`ProviderAdapter`]: extract an identifier from the URL, fetch the raw
//! upstream record, and normalize it. The set of adapters is closed and lives
//! in the [`Adapter`] enum, which the [`Dispatcher`] selects from.
//!
//! # Architecture
//!
//! - [`ProviderAdapter`] - extract / fetch / normalize contract
//! - [`Adapter`] - closed set of adapters, dispatched by `match`
//! - [`Dispatcher`] - picks an adapter by URL signature, falls back to a generic record
//! - [`CachedResolver`] - wraps the dispatcher with a link-metadata cache
//! - [`ResolverConfig`] - credentials, endpoints, timeouts and proxy chain
//!
//! # Example
//!
//! ```no_run
//! use linkmeta_core::resolver::{Dispatcher, ResolverConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(&ResolverConfig::default())?;
//! let metadata = dispatcher.resolve("https://github.com/octocat/Hello-World").await?;
//! println!("{}: {}", metadata.provider_type, metadata.title);
//! # Ok(())
//! # }
//! ```

mod cached;
mod discord;
mod dispatcher;
mod error;
mod github;
mod http_client;
mod spotify;
mod steam;
pub mod utils;
mod youtube;

pub use cached::CachedResolver;
pub use discord::DiscordAdapter;
pub use dispatcher::{Dispatcher, MATCHER_TABLE, SignatureMatcher, detect_provider};
pub use error::ResolveError;
pub use github::{GithubAdapter, GithubTarget};
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpSettings, build_http_client,
};
pub use spotify::SpotifyAdapter;
pub use steam::{SteamAdapter, SteamProfileRef};
pub use youtube::{ChannelRef, YoutubeAdapter};

use std::fmt;
use std::future::Future;

use tracing::debug;
use url::Url;

use crate::fetcher::ProxyChain;
use crate::metadata::{NormalizedMetadata, ProviderType};

/// Default Discord REST API base.
pub const DEFAULT_DISCORD_API: &str = "https://discord.com/api/v10";
/// Default Discord CDN base, used for server icons.
pub const DEFAULT_DISCORD_CDN: &str = "https://cdn.discordapp.com";
/// Default GitHub REST API base.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
/// Default YouTube Data API base.
pub const DEFAULT_YOUTUBE_API: &str = "https://www.googleapis.com/youtube/v3";
/// Default Spotify oEmbed endpoint.
pub const DEFAULT_SPOTIFY_OEMBED: &str = "https://open.spotify.com/oembed";
/// Default Steam Web API base.
pub const DEFAULT_STEAM_API: &str = "https://api.steampowered.com";

/// Contract every provider adapter implements.
///
/// `extract_identifier` is pure and never touches the network. `fetch` is the
/// only step that does I/O, and `normalize` maps whatever the upstream
/// returned onto the common record.
pub trait ProviderAdapter {
    /// What the adapter pulls out of a URL (invite code, login, channel ref...).
    type Identifier: fmt::Debug + Send + Sync;
    /// Raw upstream record handed from `fetch` to `normalize`.
    type Raw: Send;

    /// Provider this adapter serves.
    fn provider(&self) -> ProviderType;

    /// Extracts the provider identifier, or `None` when the URL has no usable one.
    fn extract_identifier(&self, url: &Url) -> Option<Self::Identifier>;

    /// Fetches the raw upstream record for an identifier.
    fn fetch(
        &self,
        identifier: &Self::Identifier,
    ) -> impl Future<Output = Result<Self::Raw, ResolveError>> + Send;

    /// Maps the raw record onto [`NormalizedMetadata`].
    fn normalize(&self, raw: Self::Raw) -> NormalizedMetadata;
}

/// Runs one adapter end to end: extract, fetch, normalize.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] when no identifier can be extracted,
/// otherwise whatever `fetch` returns.
pub async fn run_adapter<A>(
    adapter: &A,
    input: &str,
    url: &Url,
) -> Result<NormalizedMetadata, ResolveError>
where
    A: ProviderAdapter + Sync,
{
    let provider = adapter.provider();
    let Some(identifier) = adapter.extract_identifier(url) else {
        return Err(ResolveError::invalid_url(
            provider,
            input,
            "no identifier could be extracted from this link",
        ));
    };
    debug!(%provider, ?identifier, "Extracted provider identifier");

    let raw = adapter.fetch(&identifier).await?;
    Ok(adapter.normalize(raw))
}

/// The closed set of provider adapters.
#[derive(Debug, Clone)]
pub enum Adapter {
    Discord(DiscordAdapter),
    Github(GithubAdapter),
    Youtube(YoutubeAdapter),
    Spotify(SpotifyAdapter),
    Steam(SteamAdapter),
}

impl Adapter {
    /// Provider served by the wrapped adapter.
    #[must_use]
    pub fn provider(&self) -> ProviderType {
        match self {
            Self::Discord(adapter) => adapter.provider(),
            Self::Github(adapter) => adapter.provider(),
            Self::Youtube(adapter) => adapter.provider(),
            Self::Spotify(adapter) => adapter.provider(),
            Self::Steam(adapter) => adapter.provider(),
        }
    }

    /// Resolves `input` (already parsed as `url`) with the wrapped adapter.
    ///
    /// # Errors
    ///
    /// Returns the adapter's [`ResolveError`] unchanged.
    pub async fn resolve(&self, input: &str, url: &Url) -> Result<NormalizedMetadata, ResolveError> {
        match self {
            Self::Discord(adapter) => run_adapter(adapter, input, url).await,
            Self::Github(adapter) => run_adapter(adapter, input, url).await,
            Self::Youtube(adapter) => run_adapter(adapter, input, url).await,
            Self::Spotify(adapter) => run_adapter(adapter, input, url).await,
            Self::Steam(adapter) => run_adapter(adapter, input, url).await,
        }
    }
}

/// Upstream base URLs, overridable for tests and self-hosted mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub discord_api: String,
    pub discord_cdn: String,
    pub github_api: String,
    pub youtube_api: String,
    pub spotify_oembed: String,
    pub steam_api: String,
}

impl ProviderEndpoints {
    /// Points every provider at one base URL (a mock server in tests).
    ///
    /// The Spotify endpoint becomes `{base}/oembed` so it stays distinct from
    /// the other APIs.
    #[must_use]
    pub fn all_at(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            discord_api: base.to_string(),
            discord_cdn: base.to_string(),
            github_api: base.to_string(),
            youtube_api: base.to_string(),
            spotify_oembed: format!("{base}/oembed"),
            steam_api: base.to_string(),
        }
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            discord_api: DEFAULT_DISCORD_API.to_string(),
            discord_cdn: DEFAULT_DISCORD_CDN.to_string(),
            github_api: DEFAULT_GITHUB_API.to_string(),
            youtube_api: DEFAULT_YOUTUBE_API.to_string(),
            spotify_oembed: DEFAULT_SPOTIFY_OEMBED.to_string(),
            steam_api: DEFAULT_STEAM_API.to_string(),
        }
    }
}

/// Everything the adapters need, passed in explicitly at construction.
///
/// Credentials are optional. An adapter whose credential is missing still
/// recognizes its links but fails with [`ResolveError::ProviderNotConfigured`].
#[derive(Clone, Default)]
pub struct ResolverConfig {
    /// GitHub token; raises the rate limit, never required.
    pub github_token: Option<String>,
    /// YouTube Data API key; required for YouTube links.
    pub youtube_api_key: Option<String>,
    /// Steam Web API key; required for Steam links.
    pub steam_api_key: Option<String>,
    /// Proxies used for Spotify and Steam requests.
    pub proxy_chain: ProxyChain,
    pub http: HttpSettings,
    pub endpoints: ProviderEndpoints,
}

impl fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted(secret: Option<&String>) -> &'static str {
            if secret.is_some() { "<redacted>" } else { "<unset>" }
        }

        f.debug_struct("ResolverConfig")
            .field("github_token", &redacted(self.github_token.as_ref()))
            .field("youtube_api_key", &redacted(self.youtube_api_key.as_ref()))
            .field("steam_api_key", &redacted(self.steam_api_key.as_ref()))
            .field("proxy_chain", &self.proxy_chain)
            .field("http", &self.http)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// Treats blank credentials as absent.
pub(crate) fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}
