//! Discord server invites.
//!
//! Recognizes `discord.gg/<code>`, `discord.com/invite/<code>` and
//! `discordapp.com/invite/<code>`, and reads the invite with approximate
//! member counts from the public invites endpoint. No credential is needed.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::metadata::{NormalizedMetadata, ProviderType};

use super::http_client::{read_json, send};
use super::utils::{api_url, compile_static_regex, format_grouped_count, link_host, path_segments};
use super::{ProviderAdapter, ResolveError};

static INVITE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^[A-Za-z0-9-]{2,64}$"));

#[derive(Debug, Deserialize)]
struct InviteResponse {
    guild: Option<InviteGuild>,
    approximate_member_count: Option<u64>,
    approximate_presence_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteGuild {
    id: String,
    name: String,
    icon: Option<String>,
    description: Option<String>,
}

/// Invite data that resolved to a server.
#[derive(Debug, Clone)]
pub struct DiscordInvite {
    code: String,
    guild: InviteGuild,
    member_count: Option<u64>,
    online_count: Option<u64>,
}

/// Adapter for Discord server invites.
#[derive(Debug, Clone)]
pub struct DiscordAdapter {
    client: Client,
    api_base: String,
    cdn_base: String,
}

impl DiscordAdapter {
    #[must_use]
    pub fn new(client: Client, api_base: impl Into<String>, cdn_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            cdn_base: cdn_base.into(),
        }
    }

    fn icon_url(&self, guild: &InviteGuild) -> Option<String> {
        let hash = guild.icon.as_deref()?;
        let extension = if hash.starts_with("a_") { "gif" } else { "png" };
        Some(format!(
            "{}/icons/{}/{hash}.{extension}",
            self.cdn_base.trim_end_matches('/'),
            guild.id
        ))
    }
}

impl ProviderAdapter for DiscordAdapter {
    type Identifier = String;
    type Raw = DiscordInvite;

    fn provider(&self) -> ProviderType {
        ProviderType::Discord
    }

    fn extract_identifier(&self, url: &Url) -> Option<String> {
        let host = link_host(url)?;
        let segments = path_segments(url);
        let code = match host.as_str() {
            "discord.gg" => segments.first()?,
            "discord.com" | "discordapp.com" if segments.first()? == "invite" => segments.get(1)?,
            _ => return None,
        };
        INVITE_CODE_RE.is_match(code).then(|| code.clone())
    }

    #[tracing::instrument(skip(self), fields(provider = "discord"))]
    async fn fetch(&self, code: &String) -> Result<DiscordInvite, ResolveError> {
        let endpoint = api_url(
            &self.api_base,
            &format!("invites/{code}"),
            &[("with_counts", "true")],
        )
        .ok_or_else(|| ResolveError::upstream(ProviderType::Discord, "invalid API base URL"))?;
        debug!(api_url = %endpoint, "Calling Discord API");

        let response = send(ProviderType::Discord, self.client.get(&endpoint)).await?;
        let invite: InviteResponse = read_json(ProviderType::Discord, response).await?;

        // Group DM invites have no guild and nothing to show.
        let guild = invite
            .guild
            .ok_or_else(|| ResolveError::not_found(ProviderType::Discord, code))?;

        Ok(DiscordInvite {
            code: code.clone(),
            guild,
            member_count: invite.approximate_member_count,
            online_count: invite.approximate_presence_count,
        })
    }

    fn normalize(&self, raw: DiscordInvite) -> NormalizedMetadata {
        let description = match (raw.member_count, raw.online_count) {
            (Some(members), Some(online)) => Some(format!(
                "{} members • {} online",
                format_grouped_count(members),
                format_grouped_count(online)
            )),
            (Some(members), None) => Some(format!("{} members", format_grouped_count(members))),
            _ => raw.guild.description.clone(),
        };

        NormalizedMetadata::new(ProviderType::Discord, raw.guild.name.clone())
            .with_optional_description(description)
            .with_image_url(self.icon_url(&raw.guild))
            .with_account_subtype("server")
            .with_extra("member_count", raw.member_count)
            .with_extra("online_count", raw.online_count)
            .with_extra("server_id", raw.guild.id)
            .with_extra("invite_code", raw.code)
    }
}
