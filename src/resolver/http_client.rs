//! Shared HTTP client construction policy for provider adapters and the proxy chain.
//!
//! This module centralizes networking defaults so every adapter stays
//! consistent on timeout, user-agent and compression. One client is built per
//! dispatcher and cloned into each adapter (clones share the connection pool).

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::metadata::ProviderType;
use crate::user_agent;

use super::ResolveError;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Timeouts applied to the shared HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds the shared HTTP client using project policy.
///
/// # Errors
///
/// Returns [`ResolveError::Upstream`] when client construction fails.
pub fn build_http_client(settings: HttpSettings) -> Result<Client, ResolveError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .timeout(Duration::from_secs(settings.read_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
        .build()
        .map_err(|error| {
            ResolveError::upstream(
                ProviderType::Other,
                &format!("HTTP client construction failed: {error}"),
            )
        })
}

/// Sends a direct provider request, mapping transport failures to [`ResolveError::Upstream`].
pub(crate) async fn send(
    provider: ProviderType,
    request: RequestBuilder,
) -> Result<Response, ResolveError> {
    request.send().await.map_err(|error| {
        tracing::warn!(%provider, error = %error, "Provider request failed");
        ResolveError::upstream(provider, &format!("request failed: {error}"))
    })
}

/// Checks the status of a provider response and decodes its JSON body.
///
/// Non-success statuses become [`ResolveError::Upstream`] carrying the status
/// and the upstream `message` field when the body has one.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: ProviderType,
    response: Response,
) -> Result<T, ResolveError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = upstream_message(&body)
            .unwrap_or_else(|| format!("{provider} returned HTTP {}", status.as_u16()));
        return Err(ResolveError::upstream_status(
            provider,
            status.as_u16(),
            &message,
        ));
    }

    response.json::<T>().await.map_err(|error| {
        ResolveError::upstream_status(
            provider,
            status.as_u16(),
            &format!("malformed response body: {error}"),
        )
    })
}

/// Pulls a human-readable message out of an upstream error body.
///
/// Covers the shapes used by the supported APIs: `{"message": ..}` and
/// `{"error": {"message": ..}}`.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(serde_json::Value::as_str)
        })
        .map(str::to_string)
}
