//! Error types for link resolution.
//!
//! This module defines structured errors for provider adapters and the
//! proxy chain, following the What/Why/Fix pattern used across the project.

use thiserror::Error;

use crate::metadata::ProviderType;

/// Errors that can occur while resolving a link into metadata.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The URL matched a provider but no identifier could be extracted
    #[error("invalid {provider} URL '{input}': {reason}\n  Suggestion: {suggestion}")]
    InvalidUrl {
        /// Provider whose grammar was expected
        provider: ProviderType,
        /// The input that could not be parsed
        input: String,
        /// Why extraction failed
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// A credential the provider requires is missing
    #[error("{provider} is not configured: missing {setting}\n  Suggestion: {suggestion}")]
    ProviderNotConfigured {
        /// Provider that cannot be called
        provider: ProviderType,
        /// Name of the missing setting
        setting: String,
        /// How to provide it
        suggestion: String,
    },

    /// The upstream API returned a non-success status or an unreadable body
    #[error("{provider} upstream error{}: {message}\n  Suggestion: {suggestion}", status_suffix(.status))]
    Upstream {
        /// Provider that failed
        provider: ProviderType,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Upstream message or failure description
        message: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The upstream call succeeded but matched nothing
    #[error("{provider} returned no match for '{query}'\n  Suggestion: {suggestion}")]
    NotFound {
        /// Provider that was searched
        provider: ProviderType,
        /// What was looked up
        query: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// Every entry of the proxy chain failed for one request
    #[error(
        "all {attempts} proxies failed fetching '{target}': {last_error}\n  Suggestion: Check network connectivity or configure additional proxies"
    )]
    AllProxiesFailed {
        /// Target URL that was being fetched
        target: String,
        /// Number of proxies that were tried
        attempts: usize,
        /// Failure observed on the last proxy
        last_error: String,
    },
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

impl ResolveError {
    /// Creates an `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(provider: ProviderType, input: &str, reason: &str) -> Self {
        Self::InvalidUrl {
            provider,
            input: input.to_string(),
            reason: reason.to_string(),
            suggestion: "Check the link format and try again".to_string(),
        }
    }

    /// Creates a `ProviderNotConfigured` error.
    #[must_use]
    pub fn not_configured(provider: ProviderType, setting: &str) -> Self {
        Self::ProviderNotConfigured {
            provider,
            setting: setting.to_string(),
            suggestion: format!("Set `{setting}` in the config file or environment"),
        }
    }

    /// Creates an `Upstream` error for a non-success HTTP status.
    #[must_use]
    pub fn upstream_status(provider: ProviderType, status: u16, message: &str) -> Self {
        let suggestion = match status {
            401 | 403 => "Check the provider credential and its permissions",
            404 => "Check that the linked resource still exists",
            429 => "The provider is rate limiting requests; try again later",
            s if s >= 500 => "The provider is unavailable; try again later",
            _ => "Check the link and try again",
        };
        Self::Upstream {
            provider,
            status: Some(status),
            message: message.to_string(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates an `Upstream` error when no usable response was received.
    #[must_use]
    pub fn upstream(provider: ProviderType, message: &str) -> Self {
        Self::Upstream {
            provider,
            status: None,
            message: message.to_string(),
            suggestion: "Check network connectivity and try again".to_string(),
        }
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(provider: ProviderType, query: &str) -> Self {
        Self::NotFound {
            provider,
            query: query.to_string(),
            suggestion: "Check the spelling of the name in the link".to_string(),
        }
    }

    /// Creates an `AllProxiesFailed` error.
    #[must_use]
    pub fn all_proxies_failed(target: &str, attempts: usize, last_error: &str) -> Self {
        Self::AllProxiesFailed {
            target: target.to_string(),
            attempts,
            last_error: last_error.to_string(),
        }
    }

    /// Stable snake_case label of the error kind, used in CLI output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::ProviderNotConfigured { .. } => "provider_not_configured",
            Self::Upstream { .. } => "upstream_error",
            Self::NotFound { .. } => "not_found",
            Self::AllProxiesFailed { .. } => "all_proxies_failed",
        }
    }
}
