//! Config defaults: fills unset values so the effective config is explicit.

use std::time::Duration;

use crate::duration::format_duration;
use crate::schema::{GitHubConfig, HttpConfig, TelnyxConfig, WatchdogConfig};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_GITHUB_COOLDOWN: Duration = Duration::from_secs(24 * 3600);
pub const DEFAULT_TELNYX_COOLDOWN: Duration = Duration::from_secs(6 * 3600);
pub const DEFAULT_STALE_DAYS: u32 = 4;
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CALL_BUDGET: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: WatchdogConfig) -> WatchdogConfig {
    let config = apply_scheduler_defaults(config);
    let config = apply_http_defaults(config);
    let config = apply_logging_defaults(config);
    apply_task_defaults(config)
}

fn fill(slot: &mut Option<String>, default: Duration) {
    if slot.as_deref().map_or(true, |s| s.trim().is_empty()) {
        *slot = Some(format_duration(default));
    }
}

fn apply_scheduler_defaults(mut config: WatchdogConfig) -> WatchdogConfig {
    fill(&mut config.scheduler.interval, DEFAULT_INTERVAL);
    config
}

fn apply_http_defaults(mut config: WatchdogConfig) -> WatchdogConfig {
    let HttpConfig {
        request_timeout,
        connect_timeout,
        call_budget,
        max_retries,
        initial_backoff,
        max_backoff,
        backoff_multiplier,
    } = &mut config.http;
    fill(request_timeout, DEFAULT_REQUEST_TIMEOUT);
    fill(connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    fill(call_budget, DEFAULT_CALL_BUDGET);
    fill(initial_backoff, DEFAULT_INITIAL_BACKOFF);
    fill(max_backoff, DEFAULT_MAX_BACKOFF);
    max_retries.get_or_insert(DEFAULT_MAX_RETRIES);
    backoff_multiplier.get_or_insert(DEFAULT_BACKOFF_MULTIPLIER);
    config
}

fn apply_logging_defaults(mut config: WatchdogConfig) -> WatchdogConfig {
    if config.logging.level.as_deref().map_or(true, |s| s.trim().is_empty()) {
        config.logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config.logging.json.get_or_insert(false);
    config
}

fn apply_task_defaults(mut config: WatchdogConfig) -> WatchdogConfig {
    if let Some(TelnyxConfig {
        notification_cooldown,
        ..
    }) = &mut config.tasks.telnyx
    {
        fill(notification_cooldown, DEFAULT_TELNYX_COOLDOWN);
    }

    if let Some(GitHubConfig {
        base_url,
        stale_days,
        notification_cooldown,
        ..
    }) = &mut config.tasks.github
    {
        if base_url.as_deref().map_or(true, |s| s.trim().is_empty()) {
            *base_url = Some(DEFAULT_GITHUB_BASE_URL.to_string());
        }
        if stale_days.map_or(true, |d| d <= 0) {
            *stale_days = Some(i64::from(DEFAULT_STALE_DAYS));
        }
        fill(notification_cooldown, DEFAULT_GITHUB_COOLDOWN);
    }
    config
}
