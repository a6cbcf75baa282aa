//! Provider selection and the generic fallback.
//!
//! Selection is a pure function of the link: its canonical host and path are
//! tested against [`MATCHER_TABLE`] in priority order and the first matching
//! row names the provider. Links that match nothing, or that are not URLs at
//! all, become a generic "External Link" record without any network call.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::fetcher::{ProxyChain, ResilientFetcher};
use crate::metadata::{NormalizedMetadata, ProviderType};

use super::http_client::build_http_client;
use super::utils::{is_web_link, link_host, parse_link_url};
use super::{
    Adapter, DiscordAdapter, GithubAdapter, ResolveError, ResolverConfig,
    SpotifyAdapter, SteamAdapter, YoutubeAdapter, non_blank,
};

/// Tests a canonical host and URL path for a provider's signature.
pub type SignatureMatcher = fn(host: &str, path: &str) -> bool;

/// Provider signatures, highest priority first. The first match wins.
pub const MATCHER_TABLE: [(ProviderType, SignatureMatcher); 5] = [
    (ProviderType::Discord, is_discord_invite),
    (ProviderType::Github, is_github),
    (ProviderType::Youtube, is_youtube),
    (ProviderType::Spotify, is_spotify_track),
    (ProviderType::Steam, is_steam_community),
];

/// True when `host` is `domain` or one of its subdomains.
fn host_is(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn is_discord_invite(host: &str, path: &str) -> bool {
    host == "discord.gg"
        || ((host == "discord.com" || host == "discordapp.com") && path.starts_with("/invite/"))
}

fn is_github(host: &str, _path: &str) -> bool {
    host == "github.com"
}

fn is_youtube(host: &str, _path: &str) -> bool {
    host_is(host, "youtube.com")
}

fn is_spotify_track(host: &str, path: &str) -> bool {
    host == "open.spotify.com" && path.contains("/track/")
}

fn is_steam_community(host: &str, _path: &str) -> bool {
    host == "steamcommunity.com"
}

/// Returns the provider whose signature matches a parsed link.
///
/// Only plain `http`/`https` links are matched; other schemes and links
/// carrying credentials never name a provider.
#[must_use]
pub fn detect_provider(url: &Url) -> Option<ProviderType> {
    if !is_web_link(url) {
        return None;
    }
    let host = link_host(url)?;
    let path = url.path();
    MATCHER_TABLE
        .iter()
        .find(|(_, matches)| matches(&host, path))
        .map(|(provider, _)| *provider)
}

/// Routes links to provider adapters.
///
/// The adapters share one HTTP client. Spotify and Steam reach their APIs
/// through the proxy chain; the others call their APIs directly.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    adapters: Vec<Adapter>,
}

impl Dispatcher {
    /// Builds every adapter from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the HTTP client cannot be built.
    #[tracing::instrument(skip(config))]
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = build_http_client(config.http)?;
        let chain: Arc<ProxyChain> = Arc::new(config.proxy_chain.clone());
        let fetcher = ResilientFetcher::new(client.clone(), chain);
        let endpoints = &config.endpoints;

        let adapters = vec![
            Adapter::Discord(DiscordAdapter::new(
                client.clone(),
                &endpoints.discord_api,
                &endpoints.discord_cdn,
            )),
            Adapter::Github(GithubAdapter::new(
                client.clone(),
                &endpoints.github_api,
                non_blank(config.github_token.as_ref()),
            )),
            Adapter::Youtube(YoutubeAdapter::new(
                client,
                &endpoints.youtube_api,
                non_blank(config.youtube_api_key.as_ref()),
            )),
            Adapter::Spotify(SpotifyAdapter::new(
                fetcher.clone(),
                &endpoints.spotify_oembed,
            )),
            Adapter::Steam(SteamAdapter::new(
                fetcher,
                &endpoints.steam_api,
                non_blank(config.steam_api_key.as_ref()),
            )),
        ];
        Ok(Self::from_adapters(adapters))
    }

    /// Creates a dispatcher over an explicit adapter set.
    #[must_use]
    pub fn from_adapters(adapters: Vec<Adapter>) -> Self {
        Self { adapters }
    }

    /// Returns the provider a link would be routed to, if any.
    #[must_use]
    pub fn detect(&self, input: &str) -> Option<ProviderType> {
        parse_link_url(input).as_ref().and_then(detect_provider)
    }

    /// Resolves a link into normalized metadata.
    ///
    /// Unrecognized links (and non-URLs) return the generic record and never
    /// touch the network.
    ///
    /// # Errors
    ///
    /// Returns the selected adapter's [`ResolveError`]. Adapter failures are
    /// not replaced by the generic record.
    #[tracing::instrument(skip(self), fields(provider))]
    pub async fn resolve(&self, input: &str) -> Result<NormalizedMetadata, ResolveError> {
        let link = input.trim();
        let Some(url) = parse_link_url(link) else {
            debug!("Input is not a URL; using generic record");
            return Ok(NormalizedMetadata::generic_link(link));
        };

        let adapter = detect_provider(&url).and_then(|provider| {
            self.adapters
                .iter()
                .find(|adapter| adapter.provider() == provider)
        });
        let Some(adapter) = adapter else {
            debug!("No provider signature matched; using generic record");
            return Ok(NormalizedMetadata::generic_link(link));
        };

        tracing::Span::current().record("provider", adapter.provider().as_str());
        let metadata = adapter.resolve(link, &url).await?;
        info!(title = %metadata.title, "Resolved link metadata");
        Ok(metadata)
    }
}
