//! Steam community profiles.
//!
//! `/profiles/<steamid64>` links carry the numeric ID directly; `/id/<vanity>`
//! links are first resolved through `ResolveVanityURL`. Both calls go through
//! the proxy chain and need a Web API key.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::fetcher::ResilientFetcher;
use crate::metadata::{NormalizedMetadata, ProviderType};

use super::http_client::read_json;
use super::utils::{api_url, link_host, path_segments};
use super::{ProviderAdapter, ResolveError};

const RESOLVE_VANITY_PATH: &str = "ISteamUser/ResolveVanityURL/v0001/";
const PLAYER_SUMMARIES_PATH: &str = "ISteamUser/GetPlayerSummaries/v0002/";
const PROFILE_DESCRIPTION: &str = "Profile";
/// `ResolveVanityURL` reports a match with `success == 1`.
const VANITY_MATCH: i64 = 1;

/// How a Steam link names its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteamProfileRef {
    /// 64-bit numeric Steam ID.
    SteamId(String),
    /// Custom profile name.
    Vanity(String),
}

#[derive(Debug, Deserialize)]
struct VanityEnvelope {
    response: VanityResult,
}

#[derive(Debug, Deserialize)]
struct VanityResult {
    success: i64,
    steamid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesResult,
}

#[derive(Debug, Deserialize)]
struct SummariesResult {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

/// One player from `GetPlayerSummaries`.
#[derive(Debug, Deserialize)]
pub struct PlayerSummary {
    steamid: String,
    personaname: String,
    realname: Option<String>,
    avatarfull: Option<String>,
    profileurl: Option<String>,
    personastate: Option<u8>,
}

/// Label for Steam's `personastate` code.
fn persona_state_label(state: u8) -> &'static str {
    match state {
        1 => "online",
        2 => "busy",
        3 => "away",
        4 => "snooze",
        5 => "looking_to_trade",
        6 => "looking_to_play",
        _ => "offline",
    }
}

/// Adapter for Steam community profiles.
#[derive(Clone)]
pub struct SteamAdapter {
    fetcher: ResilientFetcher,
    api_base: String,
    api_key: Option<String>,
}

impl SteamAdapter {
    #[must_use]
    pub fn new(
        fetcher: ResilientFetcher,
        api_base: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
            api_key,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ResolveError> {
        let target = api_url(&self.api_base, path, query)
            .ok_or_else(|| ResolveError::upstream(ProviderType::Steam, "invalid API base URL"))?;
        let response = self.fetcher.fetch_via_chain(&target).await?;
        read_json(ProviderType::Steam, response).await
    }

    async fn resolve_vanity(&self, vanity: &str, api_key: &str) -> Result<String, ResolveError> {
        let envelope: VanityEnvelope = self
            .get_json(RESOLVE_VANITY_PATH, &[("key", api_key), ("vanityurl", vanity)])
            .await?;
        match envelope.response {
            VanityResult {
                success: VANITY_MATCH,
                steamid: Some(steam_id),
            } => {
                debug!(%vanity, %steam_id, "Resolved Steam vanity name");
                Ok(steam_id)
            }
            _ => Err(ResolveError::not_found(ProviderType::Steam, vanity)),
        }
    }
}

impl std::fmt::Debug for SteamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamAdapter")
            .field("api_base", &self.api_base)
            .field("configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl ProviderAdapter for SteamAdapter {
    type Identifier = SteamProfileRef;
    type Raw = PlayerSummary;

    fn provider(&self) -> ProviderType {
        ProviderType::Steam
    }

    fn extract_identifier(&self, url: &Url) -> Option<SteamProfileRef> {
        if link_host(url)? != "steamcommunity.com" {
            return None;
        }
        let segments = path_segments(url);
        let value = segments.get(1).filter(|value| !value.trim().is_empty())?;
        match segments.first()?.as_str() {
            "profiles" if value.chars().all(|ch| ch.is_ascii_digit()) => {
                Some(SteamProfileRef::SteamId(value.clone()))
            }
            "id" => Some(SteamProfileRef::Vanity(value.clone())),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self), fields(provider = "steam"))]
    async fn fetch(&self, profile: &SteamProfileRef) -> Result<PlayerSummary, ResolveError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ResolveError::not_configured(
                ProviderType::Steam,
                "steam_api_key",
            ));
        };

        let steam_id = match profile {
            SteamProfileRef::SteamId(id) => id.clone(),
            SteamProfileRef::Vanity(vanity) => self.resolve_vanity(vanity, api_key).await?,
        };

        let envelope: SummariesEnvelope = self
            .get_json(PLAYER_SUMMARIES_PATH, &[("key", api_key), ("steamids", &steam_id)])
            .await?;
        envelope
            .response
            .players
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::not_found(ProviderType::Steam, &steam_id))
    }

    fn normalize(&self, raw: PlayerSummary) -> NormalizedMetadata {
        let description = match raw.realname.as_deref().map(str::trim) {
            Some(realname) if !realname.is_empty() => {
                format!("{PROFILE_DESCRIPTION} · {realname}")
            }
            _ => PROFILE_DESCRIPTION.to_string(),
        };

        NormalizedMetadata::new(ProviderType::Steam, raw.personaname)
            .with_description(description)
            .with_image_url(raw.avatarfull)
            .with_account_subtype("profile")
            .with_extra("steam_id", raw.steamid)
            .with_extra(
                "persona_state",
                raw.personastate.map(persona_state_label),
            )
            .with_extra("profile_url", raw.profileurl)
    }
}
