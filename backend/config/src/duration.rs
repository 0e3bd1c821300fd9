//! Go-style duration strings: `300ms`, `45s`, `1.5h`, `2h30m`.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Whole-string shape: one or more `<number><unit>` components.
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|ms|s|m|h))+$").unwrap()
});

static COMPONENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]*)?|\.[0-9]+)(ns|us|µs|ms|s|m|h)").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid duration {0:?}")]
pub struct DurationParseError(pub String);

/// Parses a non-negative Go-style duration. A bare `0` is accepted.
pub fn parse_duration(raw: &str) -> Result<Duration, DurationParseError> {
    let s = raw.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if !DURATION_PATTERN.is_match(s) {
        return Err(DurationParseError(raw.to_string()));
    }

    let mut secs = 0f64;
    for caps in COMPONENT_PATTERN.captures_iter(s) {
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| DurationParseError(raw.to_string()))?;
        let unit = match &caps[2] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            _ => 3600.0,
        };
        secs += value * unit;
    }

    Duration::try_from_secs_f64(secs).map_err(|_| DurationParseError(raw.to_string()))
}

/// `None` or blank means "use the default"; otherwise the parse result.
pub fn parse_optional(raw: Option<&str>) -> Option<Result<Duration, DurationParseError>> {
    match raw.map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(parse_duration(s)),
    }
}

/// Resolves an optional duration, falling back to `default` when the value is
/// absent or unparsable. Invalid values are reported by validation.
pub fn duration_or_default(raw: Option<&str>, default: Duration) -> Duration {
    match parse_optional(raw) {
        Some(Ok(d)) => d,
        _ => default,
    }
}

/// Formats a duration compactly, e.g. `5m`, `1h30m`, `500ms`.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        return format!("{total_ms}ms");
    }

    let hours = d.as_secs() / 3600;
    let minutes = (d.as_secs() % 3600) / 60;
    let millis = total_ms % 60_000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if millis > 0 {
        if millis % 1000 == 0 {
            out.push_str(&format!("{}s", millis / 1000));
        } else {
            out.push_str(&format!("{}s", millis as f64 / 1000.0));
        }
    }
    out
}
