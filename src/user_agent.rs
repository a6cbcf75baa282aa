//! Shared User-Agent string for provider and proxy HTTP clients.
//!
//! GitHub rejects API requests that carry no User-Agent.

/// User-Agent sent on every outgoing request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("linkmeta/{version} (link-metadata-resolver)")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_crate_version() {
        let ua = default_user_agent();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("linkmeta/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
            "UA must contain crate version"
        );
        assert!(ua.contains("link-metadata-resolver"), "UA must identify the tool: {ua}");
    }
}
