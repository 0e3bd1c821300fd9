//! Notification gate: per-key cooldowns for alert deduplication.
//!
//! A key is present only while an alert for it was delivered and has not yet
//! been swept; an absent key behaves exactly like one never notified.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

/// Minimum retention for swept entries, however short the cooldown.
pub const DEFAULT_RETENTION_FLOOR: Duration = Duration::from_secs(7 * 24 * 3600);

/// Tracks when each dedup key was last notified.
///
/// Cloning shares the underlying map. Each task owns its own gate.
#[derive(Debug, Clone, Default)]
pub struct NotificationGate {
    last_sent: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

/// Age of a record at `now`. Records from the future count as brand new.
fn age(recorded: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - recorded).to_std().unwrap_or(Duration::ZERO)
}

impl NotificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` was never recorded or its cooldown has fully elapsed.
    pub async fn should_notify(&self, key: &str, cooldown: Duration, now: DateTime<Utc>) -> bool {
        match self.last_sent.lock().await.get(key) {
            None => true,
            Some(&recorded) => age(recorded, now) >= cooldown,
        }
    }

    /// Starts `key`'s cooldown at `now`. Call only after a confirmed send.
    pub async fn record_notified(&self, key: &str, now: DateTime<Utc>) {
        self.last_sent.lock().await.insert(key.to_string(), now);
    }

    pub async fn last_notified(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_sent.lock().await.get(key).copied()
    }

    /// Evicts entries older than `max(cooldown, retention_floor)` and returns
    /// how many were removed.
    pub async fn cleanup(
        &self,
        retention_floor: Duration,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        let retention = cooldown.max(retention_floor);
        let mut map = self.last_sent.lock().await;
        let before = map.len();
        map.retain(|_, recorded| age(*recorded, now) <= retention);
        let removed = before - map.len();
        if removed > 0 {
            debug!(
                removed,
                remaining = map.len(),
                retention_secs = retention.as_secs(),
                "Evicted stale notification records"
            );
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.last_sent.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.last_sent.lock().await.is_empty()
    }
}
