//! Environment variable substitution for config values.
//!
//! Supports `${VAR_NAME}` in string values, resolved at load time. Only
//! uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes to a
//! literal `${VAR}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// A reference, with an optional leading `$` marking it as escaped.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing or empty env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree from the process
/// environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute_value(value, env, "")?)
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(substituted.into_owned()),
    }
}

/// Collect all env var names referenced in a config value tree.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars_recursive(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars_recursive(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in ENV_VAR_PATTERN.captures_iter(s) {
                if caps[1].is_empty() {
                    out.push(caps[2].to_string());
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| collect_vars_recursive(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars_recursive(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_simple_var() {
        let v = json!({"tasks": {"telnyx": {"api_key": "${TELNYX_API_KEY}"}}});
        let env = env(&[("TELNYX_API_KEY", "KEYabc")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["tasks"]["telnyx"]["api_key"], "KEYabc");
    }

    #[test]
    fn error_names_var_and_path() {
        let v = json!({"tasks": {"github": {"token": "${GITHUB_TOKEN}"}}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("GITHUB_TOKEN"));
        assert!(msg.contains("tasks.github.token"));
    }

    #[test]
    fn empty_var_is_missing() {
        let v = json!({"key": "${EMPTY}"});
        assert!(resolve_env_vars_with(&v, &env(&[("EMPTY", "")])).is_err());
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"key": "$${HOME} and ${USER_NAME}"});
        let result = resolve_env_vars_with(&v, &env(&[("USER_NAME", "bob")])).unwrap();
        assert_eq!(result["key"], "${HOME} and bob");
    }

    #[test]
    fn substitutes_inside_arrays_and_passes_plain_values() {
        let v = json!({"urls": ["tgram://${BOT}/1", "plain"], "n": 3});
        let result = resolve_env_vars_with(&v, &env(&[("BOT", "t0k")])).unwrap();
        assert_eq!(result["urls"][0], "tgram://t0k/1");
        assert_eq!(result["urls"][1], "plain");
        assert_eq!(result["n"], 3);
    }

    #[test]
    fn collects_referenced_vars() {
        let v = json!({"a": "${FOO}", "b": {"c": "${BAR} $${SKIP}"}});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR", "FOO"]);
    }
}
