//! `watchdog-config`: runtime configuration for the watchdog.
//!
//! Provides:
//! - Typed YAML schema with Go-style duration strings
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-qualified errors and warnings
//! - A redacted view safe for printing

pub mod defaults;
pub mod duration;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use duration::{duration_or_default, format_duration, parse_duration, DurationParseError};
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{into_config, load_raw_config, parse_config_with_env, DEFAULT_CONFIG_FILE};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    GitHubConfig, HttpConfig, LoggingConfig, NotifierConfig, RepositoryConfig, SchedulerConfig,
    TasksConfig, TelnyxConfig, WatchdogConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load, substitute env vars, apply defaults and validate, without acting on
/// the findings. Callers that need logging first use this, then `report.log()`.
pub async fn load_with_report(path: &Path) -> Result<(WatchdogConfig, ValidationReport)> {
    let raw = load_raw_config(path).await?;
    let config = apply_all_defaults(into_config(&raw)?);
    let report = validate(&config);
    Ok((config, report))
}

/// Load a config that is ready to run: findings are logged and any
/// validation error aborts.
pub async fn load_and_prepare(path: &Path) -> Result<WatchdogConfig> {
    let (config, report) = load_with_report(path).await?;
    report.log();
    report.into_result()?;
    Ok(config)
}
