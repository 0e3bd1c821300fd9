//! Config redaction: a safe-to-print view with credentials masked.

use serde_json::Value;
use watchdog_logging::redact_url;

/// Keys whose values are secrets outright.
static SECRET_KEYS: &[&str] = &["api_key", "token", "secret", "password"];

/// Keys holding URLs that may embed credentials.
static URL_KEYS: &[&str] = &["apprise_api_url", "apprise_service_url"];

/// Redact a config JSON value, masking secret fields.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn is_url_key(key: &str) -> bool {
    URL_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if s.is_empty() {
        return Value::String(String::new());
    }
    if is_secret_key(key) {
        // Keep a short prefix as a hint, e.g. `ghp_***`.
        let hint = if s.chars().count() > 8 {
            format!("{}***", s.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        };
        return Value::String(hint);
    }
    if is_url_key(key) {
        let urls: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(redact_url)
            .collect();
        return Value::String(urls.join(","));
    }
    Value::String(s.to_string())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

/// Paths of every value [`redact`] would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => {
            let key = path.rsplit('.').next().unwrap_or("");
            if is_secret_key(key) || is_url_key(key) {
                out.push(path.to_string());
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, &child_path, out);
            }
        }
        _ => {}
    }
}
