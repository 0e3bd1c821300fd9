use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use watchdog_core::{BalanceSource, CallContext, Clock, Notifier, SystemClock, Task};
use watchdog_logging::{log_alert, AlertEvent};
use watchdog_notifier::{NotificationGate, DEFAULT_RETENTION_FLOOR};

use crate::check::CheckResult;

/// Tunables for a [`BalanceCheckTask`].
#[derive(Debug, Clone)]
pub struct BalanceCheckSettings {
    pub name: String,
    /// Provider name used in the alert subject, e.g. `Telnyx`.
    pub label: String,
    pub threshold: f64,
    pub cooldown: Duration,
    /// Deadline for each external call, retries included.
    pub call_budget: Duration,
}

impl Default for BalanceCheckSettings {
    fn default() -> Self {
        Self {
            name: "telnyx-balance".to_string(),
            label: "Telnyx".to_string(),
            threshold: 0.0,
            cooldown: Duration::from_secs(6 * 3600),
            call_budget: Duration::from_secs(30),
        }
    }
}

/// Alerts when an account balance drops below a threshold.
pub struct BalanceCheckTask {
    settings: BalanceCheckSettings,
    source: Arc<dyn BalanceSource>,
    notifier: Arc<dyn Notifier>,
    gate: NotificationGate,
    clock: Arc<dyn Clock>,
    last_observed: Mutex<Option<f64>>,
}

/// Subject and body for a low-balance alert.
pub fn balance_alert(label: &str, balance: f64, threshold: f64) -> (String, String) {
    (
        format!("{label} Balance Alert"),
        format!(
            "Your {label} balance (${balance:.2}) has fallen below the ${threshold:.2} threshold."
        ),
    )
}

impl BalanceCheckTask {
    pub fn new(
        settings: BalanceCheckSettings,
        source: Arc<dyn BalanceSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            source,
            notifier,
            gate: NotificationGate::new(),
            clock: Arc::new(SystemClock),
            last_observed: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    fn dedup_key(&self) -> String {
        format!("balance:{}", self.settings.name)
    }

    pub fn evaluate(&self, balance: f64) -> CheckResult<f64> {
        CheckResult::new(balance, balance < self.settings.threshold, self.dedup_key())
    }

    /// Logs the balance on the first reading and whenever it changes.
    async fn observe(&self, balance: f64) {
        let mut last = self.last_observed.lock().await;
        if *last != Some(balance) {
            info!(
                task = %self.settings.name,
                balance,
                threshold = self.settings.threshold,
                "Balance updated"
            );
            *last = Some(balance);
        }
    }
}

#[async_trait]
impl Task for BalanceCheckTask {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        let ctx = CallContext::with_timeout(cancel.clone(), self.settings.call_budget);
        let balance = self
            .source
            .get_balance(&ctx)
            .await
            .context("failed to fetch balance")?;
        self.observe(balance).await;

        let now = self.clock.now();
        let check = self.evaluate(balance);
        for key in check.alert_keys() {
            if !self.gate.should_notify(key, self.settings.cooldown, now).await {
                let last_sent = self.gate.last_notified(key).await.unwrap_or(now);
                info!(
                    task = %self.settings.name,
                    balance,
                    last_sent = %last_sent,
                    "Balance below threshold, alert suppressed by cooldown"
                );
                log_alert(&self.settings.name, key, AlertEvent::Suppressed { last_sent });
                continue;
            }

            let (subject, body) = balance_alert(&self.settings.label, balance, self.settings.threshold);
            let send_ctx = CallContext::with_timeout(cancel.clone(), self.settings.call_budget);
            if let Err(e) = self.notifier.send(&send_ctx, &subject, &body).await {
                log_alert(
                    &self.settings.name,
                    key,
                    AlertEvent::Failed {
                        error_msg: e.to_string(),
                    },
                );
                return Err(e).context("failed to send balance alert");
            }
            self.gate.record_notified(key, now).await;
            log_alert(&self.settings.name, key, AlertEvent::Sent { subject });
        }

        if !check.alertable {
            debug!(task = %self.settings.name, balance, "Balance above threshold");
        }

        self.gate
            .cleanup(DEFAULT_RETENTION_FLOOR, self.settings.cooldown, now)
            .await;
        Ok(())
    }
}
