//! GitHub repositories and profiles.
//!
//! `github.com/<owner>/<repo>` resolves to a repository, `github.com/<login>`
//! to a user or organization profile. A token is optional and only raises
//! the rate limit.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::metadata::{NormalizedMetadata, ProviderType};

use super::http_client::{read_json, send};
use super::utils::{api_url, compile_static_regex, link_host, path_segments};
use super::{ProviderAdapter, ResolveError};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

static LOGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$"));
static REPO_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^[A-Za-z0-9._-]{1,100}$"));

/// First path segments that are GitHub pages, not accounts.
const RESERVED_SEGMENTS: &[&str] = &[
    "about",
    "collections",
    "enterprise",
    "explore",
    "features",
    "login",
    "marketplace",
    "notifications",
    "orgs",
    "pricing",
    "pulls",
    "search",
    "settings",
    "sponsors",
    "topics",
    "trending",
];

/// What a GitHub link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubTarget {
    Repository { owner: String, repo: String },
    Profile { login: String },
}

#[derive(Debug, Deserialize)]
pub struct RepoResponse {
    full_name: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    html_url: Option<String>,
    owner: RepoOwner,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    public_repos: u64,
    #[serde(rename = "type")]
    account_type: Option<String>,
    html_url: Option<String>,
}

/// Raw GitHub record, one per target kind.
#[derive(Debug)]
pub enum GithubRecord {
    Repository(RepoResponse),
    Profile(UserResponse),
}

/// Adapter for GitHub repositories and profiles.
#[derive(Clone)]
pub struct GithubAdapter {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubAdapter {
    #[must_use]
    pub fn new(client: Client, api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ResolveError> {
        let endpoint = api_url(&self.api_base, path, &[])
            .ok_or_else(|| ResolveError::upstream(ProviderType::Github, "invalid API base URL"))?;
        debug!(api_url = %endpoint, authenticated = self.token.is_some(), "Calling GitHub API");

        let mut request = self.client.get(&endpoint).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = send(ProviderType::Github, request).await?;
        read_json(ProviderType::Github, response).await
    }
}

impl std::fmt::Debug for GithubAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubAdapter")
            .field("api_base", &self.api_base)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ProviderAdapter for GithubAdapter {
    type Identifier = GithubTarget;
    type Raw = GithubRecord;

    fn provider(&self) -> ProviderType {
        ProviderType::Github
    }

    fn extract_identifier(&self, url: &Url) -> Option<GithubTarget> {
        if link_host(url)? != "github.com" {
            return None;
        }
        let segments = path_segments(url);
        let owner = segments.first()?;
        if RESERVED_SEGMENTS.contains(&owner.to_ascii_lowercase().as_str())
            || !LOGIN_RE.is_match(owner)
        {
            return None;
        }

        match segments.get(1) {
            None => Some(GithubTarget::Profile {
                login: owner.clone(),
            }),
            Some(repo) => {
                let repo = repo.strip_suffix(".git").unwrap_or(repo);
                REPO_RE.is_match(repo).then(|| GithubTarget::Repository {
                    owner: owner.clone(),
                    repo: repo.to_string(),
                })
            }
        }
    }

    #[tracing::instrument(skip(self), fields(provider = "github"))]
    async fn fetch(&self, target: &GithubTarget) -> Result<GithubRecord, ResolveError> {
        match target {
            GithubTarget::Repository { owner, repo } => self
                .get_json(&format!("repos/{owner}/{repo}"))
                .await
                .map(GithubRecord::Repository),
            GithubTarget::Profile { login } => self
                .get_json(&format!("users/{login}"))
                .await
                .map(GithubRecord::Profile),
        }
    }

    fn normalize(&self, raw: GithubRecord) -> NormalizedMetadata {
        match raw {
            GithubRecord::Repository(repo) => {
                NormalizedMetadata::new(ProviderType::Github, repo.full_name)
                    .with_optional_description(repo.description)
                    .with_image_url(repo.owner.avatar_url)
                    .with_account_subtype("repository")
                    .with_extra("stars", repo.stargazers_count)
                    .with_extra("forks", repo.forks_count)
                    .with_extra("language", repo.language)
                    .with_extra("html_url", repo.html_url)
            }
            GithubRecord::Profile(user) => {
                let title = user
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| user.login.clone());
                let subtype = user
                    .account_type
                    .map_or_else(|| "user".to_string(), |kind| kind.to_ascii_lowercase());

                NormalizedMetadata::new(ProviderType::Github, title)
                    .with_optional_description(user.bio)
                    .with_image_url(user.avatar_url)
                    .with_account_subtype(subtype)
                    .with_extra("login", user.login)
                    .with_extra("followers", user.followers)
                    .with_extra("public_repos", user.public_repos)
                    .with_extra("html_url", user.html_url)
            }
        }
    }
}
