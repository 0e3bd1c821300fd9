//! Config file reading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::env::{resolve_env_vars, resolve_env_vars_with};
use crate::schema::WatchdogConfig;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Read the YAML file at `path` into an untyped value tree.
pub async fn load_raw_config(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value = parse_yaml(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;
    debug!(path = %path.display(), "Read config");
    Ok(value)
}

fn parse_yaml(raw: &str) -> Result<Value> {
    let value: Option<Value> = serde_yaml::from_str(raw)?;
    // An empty file is an empty mapping.
    Ok(value.unwrap_or_else(|| Value::Object(Default::default())))
}

/// Substitute env vars and deserialize into the typed schema.
pub fn into_config(value: &Value) -> Result<WatchdogConfig> {
    let value = resolve_env_vars(value).context("Failed to resolve env vars in config")?;
    serde_json::from_value(value).context("Failed to deserialize config")
}

/// Parse a YAML document against an explicit environment (useful for testing).
pub fn parse_config_with_env(raw: &str, env: &HashMap<String, String>) -> Result<WatchdogConfig> {
    let value = parse_yaml(raw)?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    serde_json::from_value(value).context("Failed to deserialize config")
}
