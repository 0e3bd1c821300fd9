use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::context::CallContext;
use crate::error::Result;
use crate::types::{CheckSuite, CommitStatus, PullRequest, RepoRef};

/// A unit of periodic work driven by the scheduler.
///
/// `run` is invoked once per tick. The token is the task's stop signal; long
/// external calls should derive a [`CallContext`] from it so `stop()` reaches them.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Human-readable name used in logs and dedup keys.
    fn name(&self) -> &str;

    async fn run(&self, cancel: &CancellationToken) -> anyhow::Result<()>;
}

/// A single numeric reading, e.g. an account balance.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn get_balance(&self, ctx: &CallContext) -> Result<f64>;
}

/// Lists the open pull requests of one repository.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn list_open_pull_requests(
        &self,
        ctx: &CallContext,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequest>>;
}

/// Auxiliary CI signals for a commit. Only ever used to decorate alerts.
#[async_trait]
pub trait CiStatusSource: Send + Sync {
    async fn commit_status(&self, ctx: &CallContext, repo: &RepoRef, sha: &str)
        -> Result<CommitStatus>;

    async fn check_suites(&self, ctx: &CallContext, repo: &RepoRef, sha: &str)
        -> Result<Vec<CheckSuite>>;
}

/// Delivers an alert. Success or failure is the whole contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, ctx: &CallContext, subject: &str, body: &str) -> Result<()>;
}

/// Wall-clock source, injectable so cooldown logic can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
