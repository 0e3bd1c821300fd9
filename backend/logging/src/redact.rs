//! Log Redaction
//!
//! Scrubs API credentials from strings before they reach a log line.

use regex::Regex;
use std::sync::LazyLock;

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(bearer|token)\s+[A-Za-z0-9\-._~+/]+=*").unwrap());
static GITHUB_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(gh[pousr]_[A-Za-z0-9]{20,}|github_pat_[A-Za-z0-9_]{20,})\b").unwrap()
});
static TELNYX_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bKEY[0-9A-Fa-f]{16,}_[A-Za-z0-9]+\b").unwrap());

/// Redacts credential patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "$1 [REDACTED_TOKEN]");
    let redacted = GITHUB_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    TELNYX_KEY_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}

/// Reduces a notification service URL to something safe to print.
///
/// Apprise URLs carry credentials anywhere after the scheme
/// (`tgram://<bot token>/<chat id>`), so only the scheme survives. Plain
/// HTTP(S) URLs keep their host.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.trim().split_once("://") else {
        return "[REDACTED]".to_string();
    };
    if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
        let host = authority.rsplit('@').next().unwrap_or("");
        let tail = &rest[authority.len()..];
        if tail.is_empty() || tail == "/" {
            return format!("{scheme}://{host}");
        }
        return format!("{scheme}://{host}/[REDACTED]");
    }
    format!("{scheme}://[REDACTED]")
}
