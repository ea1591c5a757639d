//! Target URL helpers: masking for storage and optional validation.
//!
//! Webhook URLs frequently embed secrets in their path or query
//! (`/hooks/catch/123/abc`, `?token=...`). Only the masked form produced
//! by [`mask_url`] is ever written to history or logs.

use std::sync::LazyLock;

use regex::Regex;

/// Token that replaces everything after the host.
pub const MASK: &str = "***";

/// Number of leading characters kept when a URL cannot be parsed.
const UNPARSEABLE_PREFIX_CHARS: usize = 10;

static URL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://.+").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// Returns the storage-safe form of `url`: scheme and host, then [`MASK`].
///
/// Port, path, query, fragment and credentials are all dropped.
/// Unparseable input keeps only its first few characters.
///
/// # Example
///
/// ```
/// use hookledger::webhook::mask_url;
///
/// assert_eq!(
///     mask_url("https://hooks.example.com/secret/path?token=abc"),
///     "https://hooks.example.com/***"
/// );
/// ```
#[must_use]
pub fn mask_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{host}/{MASK}", parsed.scheme()),
            None => mask_unparseable(url),
        },
        Err(_) => mask_unparseable(url),
    }
}

fn mask_unparseable(url: &str) -> String {
    let prefix: String = url.chars().take(UNPARSEABLE_PREFIX_CHARS).collect();
    format!("{prefix}{MASK}")
}

/// Removes every whitespace character from `url`.
#[must_use]
pub fn sanitize_url(url: &str) -> String {
    url.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Cheap format check: `http://` or `https://` followed by something.
#[must_use]
pub fn validate_url_format(url: &str) -> bool {
    URL_FORMAT.is_match(url)
}

/// Full check: the URL parses and uses `http` or `https`.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}
