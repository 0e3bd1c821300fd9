//! Config validation with path-qualified messages.

use anyhow::{bail, Result};
use thiserror::Error;
use tracing::{error, warn};

use crate::duration::parse_optional;
use crate::schema::WatchdogConfig;

/// A config validation finding with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Turns errors under `prefix` into warnings. Dry runs use this for the
    /// notifier section, which they never touch.
    pub fn relax(&mut self, prefix: &str) {
        let (relaxed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.errors)
            .into_iter()
            .partition(|e| e.path.starts_with(prefix));
        self.errors = kept;
        self.warnings.extend(relaxed);
    }

    /// Emits every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for err in &self.errors {
            error!(path = %err.path, message = %err.message, "Config error");
        }
    }

    /// `Err` naming every error when the config is not usable.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let details: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        bail!("invalid configuration: {}", details.join("; "))
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &WatchdogConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_notifier(config, &mut report);
    validate_http(config, &mut report);
    validate_durations(config, &mut report);
    validate_telnyx(config, &mut report);
    validate_github(config, &mut report);
    validate_tasks_present(config, &mut report);
    report
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn validate_notifier(config: &WatchdogConfig, report: &mut ValidationReport) {
    if is_blank(&config.notifier.apprise_api_url) {
        report.error("notifier.apprise_api_url", "Apprise API URL is required");
    }
    if config.service_urls().is_empty() {
        report.error(
            "notifier.apprise_service_url",
            "At least one Apprise service URL is required",
        );
    }
}

fn validate_http(config: &WatchdogConfig, report: &mut ValidationReport) {
    if let Some(m) = config.http.backoff_multiplier {
        if !m.is_finite() || m < 1.0 {
            report.warn(
                "http.backoff_multiplier",
                format!("Multiplier {m} is below 1.0; using the default"),
            );
        }
    }
}

/// Unparsable durations fall back to their default; zero is suspicious,
/// and fatal for a polling interval.
fn validate_durations(config: &WatchdogConfig, report: &mut ValidationReport) {
    let mut fields: Vec<(&str, &Option<String>)> = vec![
        ("scheduler.interval", &config.scheduler.interval),
        ("http.request_timeout", &config.http.request_timeout),
        ("http.connect_timeout", &config.http.connect_timeout),
        ("http.call_budget", &config.http.call_budget),
        ("http.initial_backoff", &config.http.initial_backoff),
        ("http.max_backoff", &config.http.max_backoff),
    ];
    if let Some(telnyx) = &config.tasks.telnyx {
        fields.push(("tasks.telnyx.interval", &telnyx.interval));
        fields.push((
            "tasks.telnyx.notification_cooldown",
            &telnyx.notification_cooldown,
        ));
    }
    if let Some(github) = &config.tasks.github {
        fields.push(("tasks.github.interval", &github.interval));
        fields.push((
            "tasks.github.notification_cooldown",
            &github.notification_cooldown,
        ));
    }

    for (path, raw) in fields {
        match parse_optional(raw.as_deref()) {
            Some(Err(e)) => report.warn(path, format!("{e}; using the default")),
            Some(Ok(d)) if d.is_zero() && path.ends_with(".interval") => {
                report.error(path, "Interval must be greater than zero")
            }
            Some(Ok(d)) if d.is_zero() => report.warn(path, "Duration is zero"),
            _ => {}
        }
    }
}

fn validate_telnyx(config: &WatchdogConfig, report: &mut ValidationReport) {
    let Some(telnyx) = &config.tasks.telnyx else { return };
    let has_url = !is_blank(&telnyx.api_url);
    let has_key = !is_blank(&telnyx.api_key);

    if has_url && !has_key {
        report.error(
            "tasks.telnyx.api_key",
            "API key is required when api_url is set",
        );
    }
    if has_key && !has_url {
        report.warn("tasks.telnyx.api_url", "No api_url set; balance check disabled");
    }
    match telnyx.threshold {
        Some(t) if t < 0.0 => report.warn("tasks.telnyx.threshold", "Threshold is negative"),
        None if has_url => report.warn(
            "tasks.telnyx.threshold",
            "No threshold set; alerts fire only below 0",
        ),
        _ => {}
    }
}

fn validate_github(config: &WatchdogConfig, report: &mut ValidationReport) {
    let Some(github) = &config.tasks.github else { return };
    for (i, repo) in github.repositories.iter().enumerate() {
        let path = format!("tasks.github.repositories[{i}]");
        if repo.owner.trim().is_empty() {
            report.error(format!("{path}.owner"), "Repository owner is required");
        }
        if repo.repo.trim().is_empty() {
            report.error(format!("{path}.repo"), "Repository name is required");
        }
        if repo.authors.iter().any(|a| a.trim().is_empty()) {
            report.warn(format!("{path}.authors"), "Empty author entry is ignored");
        }
    }
}

fn validate_tasks_present(config: &WatchdogConfig, report: &mut ValidationReport) {
    if config.telnyx().is_none() && config.github().is_none() {
        report.warn("tasks", "No monitoring tasks are configured");
    }
}
