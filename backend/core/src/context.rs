//! Cancellation and deadline propagation for external calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, WatchdogError};

/// A cancellation token plus an optional deadline.
///
/// One context covers one logical call, including every retry attempt made on
/// its behalf, so retries eat into the same budget.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with no deadline; ends only when `cancel` fires.
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel, deadline: None }
    }

    /// A context that ends when `cancel` fires or `budget` has elapsed. A
    /// budget too large to represent as an instant means no deadline.
    pub fn with_timeout(cancel: CancellationToken, budget: Duration) -> Self {
        Self {
            cancel,
            deadline: Instant::now().checked_add(budget),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns the terminal error if the context is already done.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(WatchdogError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(WatchdogError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Resolves with the reason once the context is cancelled or expired.
    pub async fn done(&self) -> WatchdogError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => WatchdogError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => WatchdogError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                WatchdogError::Cancelled
            }
        }
    }

    /// Races `fut` against cancellation and the deadline.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check()?;
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            out = fut => Ok(out),
        }
    }

    /// Sleeps for `duration` unless the context ends first.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(tokio::time::sleep(duration)).await
    }
}
