//! Ordered proxy-chain fetching for providers that cannot be called directly.
//!
//! The [`ResilientFetcher`] issues one GET through each entry of a static
//! [`ProxyChain`] in order and returns the first successful (2xx) response.
//! A failed attempt is logged and discarded; only when the whole chain is
//! exhausted does the caller see [`ResolveError::AllProxiesFailed`], carrying
//! the last observed failure.
//!
//! Attempts are strictly sequential with no delay between them: each proxy is
//! independent, and a later proxy is never contacted once one has succeeded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkmeta_core::fetcher::{ProxyChain, ResilientFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//! let fetcher = ResilientFetcher::new(client, Arc::new(ProxyChain::default()));
//! let response = fetcher
//!     .fetch_via_chain("https://open.spotify.com/oembed?url=https%3A%2F%2Fopen.spotify.com%2Ftrack%2Fabc")
//!     .await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::resolver::ResolveError;

/// Public CORS relays tried in order by default.
pub const DEFAULT_PROXY_TEMPLATES: [&str; 3] = [
    "encoded:https://api.allorigins.win/raw?url=",
    "encoded:https://corsproxy.io/?url=",
    "encoded:https://api.codetabs.com/v1/proxy?quest=",
];

/// How a single proxy endpoint receives its target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyTemplate {
    /// Call the target itself, without a relay.
    Direct,
    /// Append the target verbatim to the prefix (`https://relay/` + target).
    Suffix(String),
    /// Append the percent-encoded target to the prefix (`https://relay/?url=` + encoded).
    EncodedQuery(String),
}

impl ProxyTemplate {
    /// Parses the textual form used in configuration.
    ///
    /// Accepted forms: `direct`, `suffix:<prefix>`, `encoded:<prefix>`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the form is not recognized
    /// or the prefix is empty.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("direct") {
            return Ok(Self::Direct);
        }

        let (kind, prefix) = trimmed
            .split_once(':')
            .ok_or_else(|| format!("proxy template '{trimmed}' must start with `suffix:` or `encoded:`"))?;
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(format!("proxy template '{trimmed}' has an empty prefix"));
        }

        match kind.trim().to_ascii_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix(prefix.to_string())),
            "encoded" => Ok(Self::EncodedQuery(prefix.to_string())),
            other => Err(format!(
                "unknown proxy template kind '{other}' (expected `direct`, `suffix` or `encoded`)"
            )),
        }
    }

    /// Builds the URL that routes `target` through this proxy.
    #[must_use]
    pub fn wrap(&self, target: &str) -> String {
        match self {
            Self::Direct => target.to_string(),
            Self::Suffix(prefix) => format!("{prefix}{target}"),
            Self::EncodedQuery(prefix) => format!("{prefix}{}", urlencoding::encode(target)),
        }
    }
}

impl fmt::Display for ProxyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Suffix(prefix) => write!(f, "suffix:{prefix}"),
            Self::EncodedQuery(prefix) => write!(f, "encoded:{prefix}"),
        }
    }
}

/// Ordered, immutable list of proxy templates shared by all resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyChain {
    templates: Vec<ProxyTemplate>,
}

impl ProxyChain {
    /// Creates a chain that tries `templates` in the given order.
    #[must_use]
    pub fn new(templates: Vec<ProxyTemplate>) -> Self {
        Self { templates }
    }

    /// A chain that calls every target directly.
    #[must_use]
    pub fn direct() -> Self {
        Self::new(vec![ProxyTemplate::Direct])
    }

    /// Returns the templates in attempt order.
    #[must_use]
    pub fn templates(&self) -> &[ProxyTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ProxyChain {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROXY_TEMPLATES
                .iter()
                .filter_map(|raw| ProxyTemplate::parse(raw).ok())
                .collect(),
        )
    }
}

/// Fetches URLs through a [`ProxyChain`], falling back proxy by proxy.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    client: Client,
    chain: Arc<ProxyChain>,
}

impl ResilientFetcher {
    /// Creates a fetcher over a shared client and chain.
    #[must_use]
    pub fn new(client: Client, chain: Arc<ProxyChain>) -> Self {
        Self { client, chain }
    }

    /// Returns the chain this fetcher walks.
    #[must_use]
    pub fn chain(&self) -> &ProxyChain {
        &self.chain
    }

    /// Issues a GET for `target` through each proxy in order.
    ///
    /// Returns the first response with a 2xx status. Transport errors and
    /// non-success statuses move on to the next proxy.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::AllProxiesFailed`] with the last observed
    /// failure when no proxy succeeds (or the chain is empty).
    #[tracing::instrument(skip(self), fields(proxies = self.chain.len()))]
    pub async fn fetch_via_chain(&self, target: &str) -> Result<Response, ResolveError> {
        let mut last_error = String::from("proxy chain is empty");

        for (index, template) in self.chain.templates().iter().enumerate() {
            let proxied = template.wrap(target);
            debug!(attempt = index + 1, proxy = %template, "Trying proxy");

            match self.client.get(&proxied).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(attempt = index + 1, proxy = %template, "Proxy fetch succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    warn!(attempt = index + 1, proxy = %template, status, "Proxy returned non-success status");
                    last_error = format!("{template} returned HTTP {status}");
                }
                Err(error) => {
                    warn!(attempt = index + 1, proxy = %template, error = %error, "Proxy request failed");
                    last_error = format!("{template} request failed: {error}");
                }
            }
        }

        Err(ResolveError::all_proxies_failed(
            target,
            self.chain.len(),
            &last_error,
        ))
    }
}
