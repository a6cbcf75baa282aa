//! Spotify tracks.
//!
//! Track metadata comes from the public oEmbed endpoint, fetched through the
//! proxy chain. oEmbed only exposes a combined title and a free-form
//! description, so the track name, artist and album are recovered from those
//! strings heuristically.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::fetcher::ResilientFetcher;
use crate::metadata::{NormalizedMetadata, ProviderType};

use super::http_client::read_json;
use super::utils::{api_url, compile_static_regex, link_host, path_segments};
use super::{ProviderAdapter, ResolveError};

const TRACK_BASE_URL: &str = "https://open.spotify.com/track";
const TITLE_SEPARATOR: &str = " - ";
const ALBUM_LINE_MARKER: char = '·';

static TRACK_ID_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^[A-Za-z0-9]{8,64}$"));
static LOCALE_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^intl-[A-Za-z]{2}(?:-[A-Za-z]{2})?$"));

/// Phrasings that introduce a quoted album name, tried in order.
static ALBUM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)\bfrom the album\s+["“]([^"”]+)["”]"#,
        r#"(?i)\bon the album\s+["“]([^"”]+)["”]"#,
        r#"(?i)\bfrom the EP\s+["“]([^"”]+)["”]"#,
        r#"(?i)\bfrom\s+["“]([^"”]+)["”]"#,
    ]
    .into_iter()
    .map(compile_static_regex)
    .collect()
});

#[derive(Debug, Deserialize)]
struct EmbedInfo {
    title: Option<String>,
    author_name: Option<String>,
    description: Option<String>,
    thumbnail_url: Option<String>,
    html: Option<String>,
}

/// An oEmbed record for one track.
#[derive(Debug)]
pub struct SpotifyTrack {
    track_id: String,
    title: String,
    author_name: Option<String>,
    description: Option<String>,
    thumbnail_url: Option<String>,
    html: Option<String>,
}

/// Adapter for Spotify track links.
#[derive(Debug, Clone)]
pub struct SpotifyAdapter {
    fetcher: ResilientFetcher,
    oembed_endpoint: String,
}

impl SpotifyAdapter {
    #[must_use]
    pub fn new(fetcher: ResilientFetcher, oembed_endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            oembed_endpoint: oembed_endpoint.into(),
        }
    }
}

/// Splits an oEmbed title into `(track, artist)`.
///
/// Titles look like `"Midnight City - M83"`. Without the separator the whole
/// title is the track and the artist comes from `author_name`.
#[must_use]
pub(crate) fn split_title(title: &str, author_name: Option<&str>) -> (String, String) {
    if let Some((track, artist)) = title.split_once(TITLE_SEPARATOR) {
        let (track, artist) = (track.trim(), artist.trim());
        if !track.is_empty() && !artist.is_empty() {
            return (track.to_string(), artist.to_string());
        }
    }
    (
        title.trim().to_string(),
        author_name.map(str::trim).unwrap_or_default().to_string(),
    )
}

/// Recovers an album name from an oEmbed description, or an empty string.
///
/// Quoted-phrase patterns are tried first. Failing those, the first
/// `·`-delimited line whose leading part is neither the track nor the artist
/// is taken as the album.
#[must_use]
pub(crate) fn recover_album(description: Option<&str>, track: &str, artist: &str) -> String {
    let Some(description) = description.map(str::trim).filter(|text| !text.is_empty()) else {
        return String::new();
    };

    for pattern in ALBUM_PATTERNS.iter() {
        if let Some(album) = pattern
            .captures(description)
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().trim())
            .filter(|album| !album.is_empty())
        {
            return album.to_string();
        }
    }

    description
        .lines()
        .filter_map(|line| line.split_once(ALBUM_LINE_MARKER))
        .map(|(before, _)| before.trim())
        .find(|candidate| {
            !candidate.is_empty()
                && !candidate.eq_ignore_ascii_case(track)
                && !candidate.eq_ignore_ascii_case(artist)
        })
        .map(str::to_string)
        .unwrap_or_default()
}

impl ProviderAdapter for SpotifyAdapter {
    type Identifier = String;
    type Raw = SpotifyTrack;

    fn provider(&self) -> ProviderType {
        ProviderType::Spotify
    }

    fn extract_identifier(&self, url: &Url) -> Option<String> {
        if link_host(url)? != "open.spotify.com" {
            return None;
        }
        let segments = path_segments(url);
        let mut rest = segments.iter().map(String::as_str).peekable();
        if rest.peek().is_some_and(|first| LOCALE_SEGMENT_RE.is_match(first)) {
            rest.next();
        }
        if rest.next()? != "track" {
            return None;
        }
        let id = rest.next()?;
        TRACK_ID_RE.is_match(id).then(|| id.to_string())
    }

    #[tracing::instrument(skip(self), fields(provider = "spotify"))]
    async fn fetch(&self, track_id: &String) -> Result<SpotifyTrack, ResolveError> {
        let track_url = format!("{TRACK_BASE_URL}/{track_id}");
        let target = api_url(&self.oembed_endpoint, "", &[("url", &track_url)]).ok_or_else(
            || ResolveError::upstream(ProviderType::Spotify, "invalid oEmbed endpoint URL"),
        )?;
        debug!(%target, "Fetching Spotify oEmbed");

        let response = self.fetcher.fetch_via_chain(&target).await?;
        let embed: EmbedInfo = read_json(ProviderType::Spotify, response).await?;

        let title = embed
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| {
                ResolveError::upstream(ProviderType::Spotify, "oEmbed response has no title")
            })?;

        Ok(SpotifyTrack {
            track_id: track_id.clone(),
            title,
            author_name: embed.author_name,
            description: embed.description,
            thumbnail_url: embed.thumbnail_url,
            html: embed.html,
        })
    }

    fn normalize(&self, raw: SpotifyTrack) -> NormalizedMetadata {
        let (track, artist) = split_title(&raw.title, raw.author_name.as_deref());
        let album = recover_album(raw.description.as_deref(), &track, &artist);

        let description = match (artist.is_empty(), album.is_empty()) {
            (false, false) if album.trim() != track.trim() => Some(format!("{artist} · {album}")),
            (false, _) => Some(artist.clone()),
            (true, false) => Some(album.clone()),
            (true, true) => None,
        };

        NormalizedMetadata::new(ProviderType::Spotify, track.clone())
            .with_optional_description(description)
            .with_image_url(raw.thumbnail_url)
            .with_account_subtype("track")
            .with_extra("track_name", track)
            .with_extra("artist", artist)
            .with_extra("album", album)
            .with_extra("track_id", raw.track_id)
            .with_extra("embed_html", raw.html)
    }
}
