//! Application configuration loading for CLI defaults.
//!
//! The config file is a flat `key = value` list:
//!
//! ```text
//! github_token = "ghp_..."
//! youtube_api_key = "AIza..."
//! steam_api_key = "..."
//! proxy = "encoded:https://corsproxy.io/?url="   # repeatable, tried in order
//! connect_timeout_secs = 10
//! read_timeout_secs = 30
//! link_metadata_ttl_secs = 3600
//! cache_db = "/var/lib/linkmeta/cache.db"
//! ```
//!
//! Credentials may also come from `LINKMETA_GITHUB_TOKEN`,
//! `LINKMETA_YOUTUBE_API_KEY` and `LINKMETA_STEAM_API_KEY`, which win over
//! the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use linkmeta_core::{HttpSettings, ProxyChain, ProxyTemplate, ResolverConfig};

/// Environment variable overriding `github_token`.
pub const ENV_GITHUB_TOKEN: &str = "LINKMETA_GITHUB_TOKEN";
/// Environment variable overriding `youtube_api_key`.
pub const ENV_YOUTUBE_API_KEY: &str = "LINKMETA_YOUTUBE_API_KEY";
/// Environment variable overriding `steam_api_key`.
pub const ENV_STEAM_API_KEY: &str = "LINKMETA_STEAM_API_KEY";

/// File configuration for linkmeta defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    pub github_token: Option<String>,
    pub youtube_api_key: Option<String>,
    pub steam_api_key: Option<String>,
    /// Proxy chain in order; empty means the built-in public relays.
    pub proxies: Vec<ProxyTemplate>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// TTL for cached link metadata.
    pub link_metadata_ttl_secs: Option<u64>,
    /// Default SQLite cache file.
    pub cache_db: Option<PathBuf>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(ttl) = self.link_metadata_ttl_secs
            && !(1..=86_400).contains(&ttl)
        {
            bail!("Invalid config value for `link_metadata_ttl_secs`: {ttl}. Expected range: 1..=86400");
        }
        Ok(())
    }

    /// Replaces credentials with non-empty values from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(token) = non_empty(ENV_GITHUB_TOKEN) {
            self.github_token = Some(token);
        }
        if let Some(key) = non_empty(ENV_YOUTUBE_API_KEY) {
            self.youtube_api_key = Some(key);
        }
        if let Some(key) = non_empty(ENV_STEAM_API_KEY) {
            self.steam_api_key = Some(key);
        }
    }

    /// Link-metadata TTL, if configured.
    #[must_use]
    pub fn link_metadata_ttl(&self) -> Option<Duration> {
        self.link_metadata_ttl_secs.map(Duration::from_secs)
    }

    /// Builds the library resolver config.
    ///
    /// `proxy_override`, when non-empty, replaces the configured chain.
    #[must_use]
    pub fn resolver_config(&self, proxy_override: Vec<ProxyTemplate>) -> ResolverConfig {
        let templates = if proxy_override.is_empty() {
            self.proxies.clone()
        } else {
            proxy_override
        };
        let proxy_chain = if templates.is_empty() {
            ProxyChain::default()
        } else {
            ProxyChain::new(templates)
        };

        let defaults = HttpSettings::default();
        ResolverConfig {
            github_token: self.github_token.clone(),
            youtube_api_key: self.youtube_api_key.clone(),
            steam_api_key: self.steam_api_key.clone(),
            proxy_chain,
            http: HttpSettings {
                connect_timeout_secs: self
                    .connect_timeout_secs
                    .unwrap_or(defaults.connect_timeout_secs),
                read_timeout_secs: self.read_timeout_secs.unwrap_or(defaults.read_timeout_secs),
            },
            ..ResolverConfig::default()
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/linkmeta/config.toml`
/// 2. `$HOME/.config/linkmeta/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("linkmeta")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("linkmeta")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file (explicit path, else the default location) and
/// applies environment overrides.
///
/// A missing default file yields an empty config; a missing explicit file is
/// an error.
pub fn load_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let mut config = match explicit_path {
        Some(path) => load_file_config(path)?,
        None => match resolve_default_config_path() {
            Some(path) if path.exists() => load_file_config(&path)?,
            _ => FileConfig::default(),
        },
    };
    config.apply_env_overrides(|name| env::var(name).ok());
    Ok(config)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let string_value = || {
            parse_string_literal(value)
                .with_context(|| format!("Invalid `{key}` value on line {line_number}"))
        };
        let integer_value = || {
            parse_integer_u64(value)
                .with_context(|| format!("Invalid `{key}` value on line {line_number}"))
        };

        match key {
            "github_token" => cfg.github_token = Some(string_value()?),
            "youtube_api_key" => cfg.youtube_api_key = Some(string_value()?),
            "steam_api_key" => cfg.steam_api_key = Some(string_value()?),
            "proxy" => {
                let template = string_value()?;
                let parsed = ProxyTemplate::parse(&template).map_err(|reason| {
                    anyhow::anyhow!("Invalid `proxy` value on line {line_number}: {reason}")
                })?;
                cfg.proxies.push(parsed);
            }
            "connect_timeout_secs" => cfg.connect_timeout_secs = Some(integer_value()?),
            "read_timeout_secs" => cfg.read_timeout_secs = Some(integer_value()?),
            "link_metadata_ttl_secs" => cfg.link_metadata_ttl_secs = Some(integer_value()?),
            "cache_db" => cfg.cache_db = Some(PathBuf::from(string_value()?)),
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
