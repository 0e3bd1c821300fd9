//! Stale pull request monitoring.
//!
//! Every tick, each watched repository is scanned for open, non-draft pull
//! requests whose last activity is older than the staleness threshold. Each
//! stale PR is its own dedup key (`owner/repo#number`), so one alert per PR
//! per cooldown. CI status only decorates the alert: a failing lookup never
//! holds it back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use watchdog_core::{
    CallContext, CiStatusSource, Clock, Notifier, PullRequest, PullRequestSource, RepoRef,
    SystemClock, Task, WatchdogError,
};
use watchdog_logging::{log_alert, redact_sensitive_data, AlertEvent};
use watchdog_notifier::{NotificationGate, DEFAULT_RETENTION_FLOOR};

use crate::check::CheckResult;

/// A repository to scan, with an optional author allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRepo {
    pub repo: RepoRef,
    /// Empty means every author. Matched case-insensitively.
    pub authors: Vec<String>,
}

impl WatchedRepo {
    pub fn new(repo: RepoRef, authors: Vec<String>) -> Self {
        let authors = authors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        Self { repo, authors }
    }

    pub fn accepts_author(&self, login: &str) -> bool {
        self.authors.is_empty() || self.authors.iter().any(|a| a.eq_ignore_ascii_case(login))
    }
}

#[derive(Debug, Clone)]
pub struct PrReviewSettings {
    pub name: String,
    pub repositories: Vec<WatchedRepo>,
    /// Inactivity after which an open PR counts as stale.
    pub stale_after: Duration,
    pub cooldown: Duration,
    /// Deadline for each external call, retries included.
    pub call_budget: Duration,
}

impl Default for PrReviewSettings {
    fn default() -> Self {
        Self {
            name: "github-pr-review".to_string(),
            repositories: Vec::new(),
            stale_after: Duration::from_secs(4 * 24 * 3600),
            cooldown: Duration::from_secs(24 * 3600),
            call_budget: Duration::from_secs(30),
        }
    }
}

/// Subject and body for a stale pull request alert.
pub fn stale_pr_alert(repo: &RepoRef, pr: &PullRequest, ci_failing: bool) -> (String, String) {
    let ci = if ci_failing { " (CI: Failing ❌)" } else { "" };
    (
        format!("Stale PR: {}", pr.title),
        format!(
            "PR #{} in {} by {} is pending review.{}\nLast updated: {}\nLink: {}",
            pr.number,
            repo,
            pr.user.login,
            ci,
            pr.updated_at.to_rfc2822(),
            pr.html_url
        ),
    )
}

pub struct PrReviewCheckTask {
    settings: PrReviewSettings,
    pulls: Arc<dyn PullRequestSource>,
    ci: Arc<dyn CiStatusSource>,
    notifier: Arc<dyn Notifier>,
    gate: NotificationGate,
    clock: Arc<dyn Clock>,
}

impl PrReviewCheckTask {
    pub fn new(
        settings: PrReviewSettings,
        pulls: Arc<dyn PullRequestSource>,
        ci: Arc<dyn CiStatusSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            pulls,
            ci,
            notifier,
            gate: NotificationGate::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shares an existing gate, e.g. to inspect dedup state from outside.
    pub fn with_gate(mut self, gate: NotificationGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    /// `None` when the PR is filtered out (draft or author not allowed);
    /// otherwise its age and whether that age makes it stale.
    pub fn evaluate(
        &self,
        watched: &WatchedRepo,
        pr: &PullRequest,
        now: DateTime<Utc>,
    ) -> Option<CheckResult<Duration>> {
        if pr.draft || !watched.accepts_author(&pr.user.login) {
            return None;
        }
        let age = (now - pr.updated_at).to_std().unwrap_or(Duration::ZERO);
        Some(CheckResult::new(
            age,
            age >= self.settings.stale_after,
            watched.repo.pull_request_key(pr.number),
        ))
    }

    async fn check_repository(
        &self,
        cancel: &CancellationToken,
        watched: &WatchedRepo,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let repo = &watched.repo;
        let ctx = CallContext::with_timeout(cancel.clone(), self.settings.call_budget);
        let pulls = self
            .pulls
            .list_open_pull_requests(&ctx, repo)
            .await
            .with_context(|| format!("failed to list pull requests for {repo}"))?;

        for pr in &pulls {
            let Some(check) = self.evaluate(watched, pr, now) else {
                continue;
            };
            for key in check.alert_keys() {
                if cancel.is_cancelled() {
                    return Err(WatchdogError::Cancelled.into());
                }
                self.notify_stale(cancel, repo, pr, key, now).await?;
            }
        }
        Ok(())
    }

    /// Gate, decorate, send and record one stale PR. Only cancellation is
    /// returned as an error; everything else is logged.
    async fn notify_stale(
        &self,
        cancel: &CancellationToken,
        repo: &RepoRef,
        pr: &PullRequest,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.gate.should_notify(key, self.settings.cooldown, now).await {
            let last_sent = self.gate.last_notified(key).await.unwrap_or(now);
            debug!(repo = %repo, pr = pr.number, last_sent = %last_sent, "Stale PR already notified");
            log_alert(&self.settings.name, key, AlertEvent::Suppressed { last_sent });
            return Ok(());
        }

        let ci_failing = self.ci_failing(cancel, repo, &pr.head.sha).await?;
        let (subject, body) = stale_pr_alert(repo, pr, ci_failing);

        let ctx = CallContext::with_timeout(cancel.clone(), self.settings.call_budget);
        match self.notifier.send(&ctx, &subject, &body).await {
            Ok(()) => {
                self.gate.record_notified(key, now).await;
                info!(repo = %repo, pr = pr.number, ci_failing, "Stale PR alert sent");
                log_alert(&self.settings.name, key, AlertEvent::Sent { subject });
            }
            Err(e) if cancel.is_cancelled() && e.is_cancellation() => return Err(e.into()),
            Err(e) => {
                error!(
                    repo = %repo,
                    pr = pr.number,
                    error = %redact_sensitive_data(&e.to_string()),
                    "Failed to send stale PR alert"
                );
                log_alert(
                    &self.settings.name,
                    key,
                    AlertEvent::Failed {
                        error_msg: e.to_string(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Whether either CI signal reports failure. Lookup errors are logged and
    /// count as "not failing"; only a stop request is propagated.
    async fn ci_failing(&self, cancel: &CancellationToken, repo: &RepoRef, sha: &str) -> Result<bool> {
        let ctx = CallContext::with_timeout(cancel.clone(), self.settings.call_budget);
        let mut failing = false;

        match self.ci.commit_status(&ctx, repo, sha).await {
            Ok(status) => failing |= status.is_failing(),
            Err(e) if cancel.is_cancelled() && e.is_cancellation() => return Err(e.into()),
            Err(e) => warn!(
                repo = %repo,
                sha,
                error = %redact_sensitive_data(&e.to_string()),
                "Failed to fetch commit status"
            ),
        }

        match self.ci.check_suites(&ctx, repo, sha).await {
            Ok(suites) => failing |= suites.iter().any(|s| s.is_failing()),
            Err(e) if cancel.is_cancelled() && e.is_cancellation() => return Err(e.into()),
            Err(e) => warn!(
                repo = %repo,
                sha,
                error = %redact_sensitive_data(&e.to_string()),
                "Failed to fetch check suites"
            ),
        }

        Ok(failing)
    }
}

#[async_trait]
impl Task for PrReviewCheckTask {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        let now = self.clock.now();

        for watched in &self.settings.repositories {
            if cancel.is_cancelled() {
                return Err(WatchdogError::Cancelled.into());
            }
            if let Err(e) = self.check_repository(cancel, watched, now).await {
                if cancel.is_cancelled() {
                    return Err(e);
                }
                error!(
                    owner = %watched.repo.owner,
                    repo = %watched.repo.repo,
                    error = %redact_sensitive_data(&format!("{e:#}")),
                    "Failed to check repository"
                );
            }
        }

        self.gate
            .cleanup(DEFAULT_RETENTION_FLOOR, self.settings.cooldown, now)
            .await;
        Ok(())
    }
}
