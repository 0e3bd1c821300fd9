//! Typed config schema.
//!
//! Every field is optional at parse time; defaults are applied afterwards and
//! durations stay as strings until resolved, so a bad value can be reported
//! with its path instead of failing the whole parse.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::duration::duration_or_default;

/// Root config object, mirrors `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub scheduler: SchedulerConfig,
    pub http: HttpConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fallback interval for tasks that do not set their own.
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout: Option<String>,
    pub connect_timeout: Option<String>,
    /// Deadline wrapping one logical call, retries included.
    pub call_budget: Option<String>,
    pub max_retries: Option<u32>,
    pub initial_backoff: Option<String>,
    pub max_backoff: Option<String>,
    pub backoff_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub apprise_api_url: Option<String>,
    /// Comma-separated Apprise service URLs.
    pub apprise_service_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Directory for daily-rolling NDJSON logs; console only when unset.
    pub dir: Option<PathBuf>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub telnyx: Option<TelnyxConfig>,
    pub github: Option<GitHubConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelnyxConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub threshold: Option<f64>,
    pub interval: Option<String>,
    pub notification_cooldown: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub interval: Option<String>,
    /// Days without activity before a PR counts as stale; `<= 0` means default.
    pub stale_days: Option<i64>,
    pub notification_cooldown: Option<String>,
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub repo: String,
    /// Optional allow-list of PR authors, matched case-insensitively.
    pub authors: Vec<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl WatchdogConfig {
    /// Interval used by tasks that do not override it.
    pub fn default_interval(&self) -> Duration {
        duration_or_default(self.scheduler.interval.as_deref(), DEFAULT_INTERVAL)
    }

    /// The task interval, falling back to `scheduler.interval`.
    pub fn task_interval(&self, task_interval: &Option<String>) -> Duration {
        duration_or_default(task_interval.as_deref(), self.default_interval())
    }

    /// Apprise service URLs, split on commas with blanks dropped.
    pub fn service_urls(&self) -> Vec<String> {
        self.notifier
            .apprise_service_url
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// The Telnyx section when it is complete enough to run.
    pub fn telnyx(&self) -> Option<&TelnyxConfig> {
        self.tasks.telnyx.as_ref().filter(|t| t.is_enabled())
    }

    /// The GitHub section when at least one repository is configured.
    pub fn github(&self) -> Option<&GitHubConfig> {
        self.tasks.github.as_ref().filter(|g| g.is_enabled())
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        duration_or_default(self.request_timeout.as_deref(), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn connect_timeout(&self) -> Duration {
        duration_or_default(self.connect_timeout.as_deref(), DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn call_budget(&self) -> Duration {
        duration_or_default(self.call_budget.as_deref(), DEFAULT_CALL_BUDGET)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn initial_backoff(&self) -> Duration {
        duration_or_default(self.initial_backoff.as_deref(), DEFAULT_INITIAL_BACKOFF)
    }

    pub fn max_backoff(&self) -> Duration {
        duration_or_default(self.max_backoff.as_deref(), DEFAULT_MAX_BACKOFF)
    }

    pub fn backoff_multiplier(&self) -> f64 {
        match self.backoff_multiplier {
            Some(m) if m.is_finite() && m >= 1.0 => m,
            _ => DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        non_empty(&self.level).unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn json(&self) -> bool {
        self.json.unwrap_or(false)
    }
}

impl TelnyxConfig {
    pub fn is_enabled(&self) -> bool {
        non_empty(&self.api_url).is_some() && non_empty(&self.api_key).is_some()
    }

    pub fn api_url(&self) -> &str {
        non_empty(&self.api_url).unwrap_or_default()
    }

    pub fn api_key(&self) -> &str {
        non_empty(&self.api_key).unwrap_or_default()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(0.0)
    }

    pub fn cooldown(&self) -> Duration {
        duration_or_default(
            self.notification_cooldown.as_deref(),
            DEFAULT_TELNYX_COOLDOWN,
        )
    }
}

impl GitHubConfig {
    pub fn is_enabled(&self) -> bool {
        !self.repositories.is_empty()
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    pub fn base_url(&self) -> &str {
        non_empty(&self.base_url).unwrap_or(DEFAULT_GITHUB_BASE_URL)
    }

    pub fn stale_days(&self) -> u32 {
        match self.stale_days {
            Some(days) if days > 0 => u32::try_from(days).unwrap_or(u32::MAX),
            _ => DEFAULT_STALE_DAYS,
        }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(u64::from(self.stale_days()) * 24 * 3600)
    }

    pub fn cooldown(&self) -> Duration {
        duration_or_default(
            self.notification_cooldown.as_deref(),
            DEFAULT_GITHUB_COOLDOWN,
        )
    }
}
