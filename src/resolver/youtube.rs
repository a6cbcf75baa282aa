//! YouTube channels.
//!
//! Channel links come in four shapes: `/channel/<id>`, `/@handle`,
//! `/user/<name>` and `/c/<name>`. Only the first carries a channel ID; the
//! others are resolved through the search endpoint, trying a few spellings of
//! the name before giving up.
//!
//! # Channel Selection
//!
//! Among search results, a channel whose title or custom URL equals the
//! queried name (case-insensitive, ignoring a leading `@`) wins. Otherwise the
//! first result is taken, so a near-miss still yields a card.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::metadata::{NormalizedMetadata, ProviderType};

use super::http_client::{read_json, send};
use super::utils::{api_url, format_compact_count, link_host, path_segments, truncate_with_ellipsis};
use super::{ProviderAdapter, ResolveError};

/// Maximum characters of the channel description kept in the card.
const DESCRIPTION_MAX_CHARS: usize = 100;
/// Search results requested per query variant.
const SEARCH_MAX_RESULTS: &str = "5";
/// Description used when neither statistics nor an about text exist.
const FALLBACK_DESCRIPTION: &str = "YouTube Channel";
const STATS_SEPARATOR: &str = " • ";

/// How a YouTube link names its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// A literal channel ID (`UC...`).
    Id(String),
    /// A handle, legacy username or custom name that must be searched.
    Query(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

/// One channel from the channels endpoint.
#[derive(Debug, Deserialize)]
pub struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    title: String,
    description: Option<String>,
    custom_url: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Counts arrive as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
    #[serde(default)]
    hidden_subscriber_count: bool,
}

/// Adapter for YouTube channels.
#[derive(Clone)]
pub struct YoutubeAdapter {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl YoutubeAdapter {
    #[must_use]
    pub fn new(client: Client, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            api_key,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ResolveError> {
        let endpoint = api_url(&self.api_base, path, query)
            .ok_or_else(|| ResolveError::upstream(ProviderType::Youtube, "invalid API base URL"))?;
        let response = send(ProviderType::Youtube, self.client.get(&endpoint)).await?;
        read_json(ProviderType::Youtube, response).await
    }

    /// Finds the channel ID for a handle or name.
    async fn search_channel(&self, query: &str, api_key: &str) -> Result<String, ResolveError> {
        for variant in query_variants(query) {
            debug!(%variant, "Searching YouTube channels");
            let results: SearchResponse = self
                .get_json(
                    "search",
                    &[
                        ("part", "snippet"),
                        ("type", "channel"),
                        ("maxResults", SEARCH_MAX_RESULTS),
                        ("q", &variant),
                        ("key", api_key),
                    ],
                )
                .await?;

            if let Some(channel_id) = pick_channel(&results.items, query) {
                info!(%variant, %channel_id, "Matched YouTube channel");
                return Ok(channel_id);
            }
        }
        Err(ResolveError::not_found(ProviderType::Youtube, query))
    }
}

impl std::fmt::Debug for YoutubeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeAdapter")
            .field("api_base", &self.api_base)
            .field("configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Spellings tried in order for a channel search, without duplicates or blanks.
#[must_use]
pub(crate) fn query_variants(query: &str) -> Vec<String> {
    let base = query.trim().trim_start_matches('@');
    let candidates = [
        base.to_string(),
        format!("@{base}"),
        base.chars().filter(|ch| ch.is_alphanumeric()).collect(),
        base.replace('.', ""),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let is_blank = candidate.trim_start_matches('@').trim().is_empty();
        if !is_blank && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn normalize_name(name: &str) -> String {
    name.trim().trim_start_matches('@').to_lowercase()
}

/// Picks the exact-match channel, else the first one with an ID.
fn pick_channel(items: &[SearchItem], query: &str) -> Option<String> {
    let wanted = normalize_name(query);
    let with_ids = || {
        items
            .iter()
            .filter_map(|item| item.id.channel_id.as_ref().map(|id| (item, id)))
    };

    with_ids()
        .find(|(item, _)| {
            normalize_name(&item.snippet.title) == wanted
                || item
                    .snippet
                    .custom_url
                    .as_deref()
                    .is_some_and(|custom| normalize_name(custom) == wanted)
        })
        .or_else(|| with_ids().next())
        .map(|(_, id)| id.clone())
}

fn parse_count(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse().ok())
}

impl ProviderAdapter for YoutubeAdapter {
    type Identifier = ChannelRef;
    type Raw = ChannelItem;

    fn provider(&self) -> ProviderType {
        ProviderType::Youtube
    }

    fn extract_identifier(&self, url: &Url) -> Option<ChannelRef> {
        let host = link_host(url)?;
        if host != "youtube.com" && !host.ends_with(".youtube.com") {
            return None;
        }
        let segments = path_segments(url);
        let first = segments.first()?;

        if let Some(handle) = first.strip_prefix('@') {
            return (!handle.is_empty()).then(|| ChannelRef::Query(handle.to_string()));
        }
        let value = segments.get(1).filter(|value| !value.trim().is_empty())?;
        match first.as_str() {
            "channel" => Some(ChannelRef::Id(value.clone())),
            "user" | "c" => Some(ChannelRef::Query(value.clone())),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self), fields(provider = "youtube"))]
    async fn fetch(&self, channel: &ChannelRef) -> Result<ChannelItem, ResolveError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ResolveError::not_configured(
                ProviderType::Youtube,
                "youtube_api_key",
            ));
        };

        let channel_id = match channel {
            ChannelRef::Id(id) => id.clone(),
            ChannelRef::Query(query) => self.search_channel(query, api_key).await?,
        };

        let details: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,statistics"),
                    ("id", &channel_id),
                    ("key", api_key),
                ],
            )
            .await?;

        details
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::not_found(ProviderType::Youtube, &channel_id))
    }

    fn normalize(&self, raw: ChannelItem) -> NormalizedMetadata {
        let stats = raw.statistics.as_ref();
        let subscribers = stats
            .filter(|stats| !stats.hidden_subscriber_count)
            .and_then(|stats| parse_count(stats.subscriber_count.as_ref()));
        let videos = stats.and_then(|stats| parse_count(stats.video_count.as_ref()));
        let views = stats.and_then(|stats| parse_count(stats.view_count.as_ref()));

        let mut parts = Vec::new();
        if let Some(count) = subscribers {
            parts.push(format!("{} subscribers", format_compact_count(count)));
        }
        if let Some(count) = videos {
            parts.push(format!("{} videos", format_compact_count(count)));
        }
        let stats_line = parts.join(STATS_SEPARATOR);

        let about = raw
            .snippet
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| truncate_with_ellipsis(text, DESCRIPTION_MAX_CHARS));

        let description = match (stats_line.is_empty(), about) {
            (false, Some(about)) => format!("{stats_line}\n{about}"),
            (false, None) => stats_line,
            (true, Some(about)) => about,
            (true, None) => FALLBACK_DESCRIPTION.to_string(),
        };

        let image_url = raw.snippet.thumbnails.and_then(|thumbnails| {
            thumbnails
                .high
                .or(thumbnails.medium)
                .or(thumbnails.default)
                .map(|thumbnail| thumbnail.url)
        });

        NormalizedMetadata::new(ProviderType::Youtube, raw.snippet.title)
            .with_description(description)
            .with_image_url(image_url)
            .with_account_subtype("channel")
            .with_extra("channel_id", raw.id)
            .with_extra("custom_url", raw.snippet.custom_url)
            .with_extra("subscriber_count", subscribers)
            .with_extra("video_count", videos)
            .with_extra("view_count", views)
    }
}
