//! Alert Event Logger
//!
//! One structured event per alert decision, on target `watchdog_alerts`, so
//! alert history can be filtered out of the general log stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AlertEvent {
    Sent {
        subject: String,
    },
    Suppressed {
        last_sent: DateTime<Utc>,
    },
    Failed {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct AlertLogEntry {
    pub task: String,
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub event: AlertEvent,
}

/// Logs an alert decision for `key` in `task`. Error text is redacted first.
pub fn log_alert(task: &str, key: &str, mut event: AlertEvent) {
    if let AlertEvent::Failed { error_msg } = &mut event {
        *error_msg = redact_sensitive_data(error_msg);
    }

    let failed = matches!(event, AlertEvent::Failed { .. });
    let entry = AlertLogEntry {
        task: task.into(),
        key: key.into(),
        timestamp: Utc::now(),
        event,
    };

    if failed {
        warn!(target: "watchdog_alerts", task, key, entry = ?entry, "Alert delivery failed");
    } else {
        info!(target: "watchdog_alerts", task, key, entry = ?entry, "Alert decision");
    }
}
