//! Shared utilities for adapters: URL normalization, API URL building and count formatting.

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Normalizes a host string: trim, strip leading "www.", trailing '.', and lowercases.
#[must_use]
pub fn canonical_host(host: &str) -> String {
    host.trim()
        .trim_start_matches("www.")
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Parses a user-submitted link, assuming `https://` when no scheme is given.
///
/// Inputs with another scheme (`mailto:`, `ftp://`) are returned as parsed.
/// A scheme-less input whose authority holds an `@` is an address, not a
/// link, and yields `None`.
#[must_use]
pub fn parse_link_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed)
        && has_explicit_scheme(&url)
    {
        return Some(url);
    }

    let authority = trimmed.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.contains('@') {
        return None;
    }
    Url::parse(&format!("https://{trimmed}")).ok()
}

/// False for `host:port` inputs that the URL parser reads as a scheme.
fn has_explicit_scheme(url: &Url) -> bool {
    !url.cannot_be_a_base() || !url.scheme().contains('.')
}

/// True for `http`/`https` URLs that carry no credentials.
#[must_use]
pub fn is_web_link(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.username().is_empty() && url.password().is_none()
}

/// Returns the canonical host of a parsed link.
#[must_use]
pub fn link_host(url: &Url) -> Option<String> {
    url.host_str().map(canonical_host)
}

/// Returns the non-empty path segments of a parsed link.
#[must_use]
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .map(|segment| {
                    urlencoding::decode(segment)
                        .map_or_else(|_| segment.to_string(), |decoded| decoded.into_owned())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Joins `path` onto `base_url` and appends the given query parameters.
///
/// Parameters are encoded by [`Url::query_pairs_mut`]. Returns `None` when
/// the base URL is not absolute.
#[must_use]
pub fn api_url(base_url: &str, path: &str, query: &[(&str, &str)]) -> Option<String> {
    let path = path.trim_start_matches('/');
    let joined = if path.is_empty() {
        base_url.to_string()
    } else {
        format!("{}/{path}", base_url.trim_end_matches('/'))
    };
    let mut url = Url::parse(&joined).ok()?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Some(url.to_string())
}

/// Formats a count with thousands separators (`12345` → `12,345`).
#[must_use]
pub fn format_grouped_count(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats a count in compact form (`1234` → `1.2K`, `3400000` → `3.4M`).
///
/// Rounds half up to one decimal. The unit follows the rounded value, so
/// `999_999` reads `1M`.
#[must_use]
pub fn format_compact_count(value: u64) -> String {
    const UNITS: [(u128, &str); 3] = [(1_000, "K"), (1_000_000, "M"), (1_000_000_000, "B")];
    let value = u128::from(value);
    let Some(mut unit) = UNITS.iter().rposition(|(threshold, _)| value >= *threshold) else {
        return value.to_string();
    };

    let tenths_in = |threshold: u128| (value * 10 + threshold / 2) / threshold;
    let mut tenths = tenths_in(UNITS[unit].0);
    if tenths >= 10_000 && unit + 1 < UNITS.len() {
        unit += 1;
        tenths = tenths_in(UNITS[unit].0);
    }

    let suffix = UNITS[unit].1;
    match tenths % 10 {
        0 => format!("{}{suffix}", tenths / 10),
        fraction => format!("{}.{fraction}{suffix}", tenths / 10),
    }
}

/// Truncates to `max_chars` characters, appending `...` when anything was cut.
#[must_use]
pub fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let truncated: String = value.chars().take(max_chars).collect();
    format!("{}...", truncated.trim_end())
}
