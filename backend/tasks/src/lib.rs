//! The periodic checks the scheduler drives.
//!
//! Each task fetches through its sources, decides whether the condition is
//! alertable, and passes every candidate alert through its own
//! [`NotificationGate`](watchdog_notifier::NotificationGate) before sending.

pub mod balance_check;
pub mod check;
pub mod pr_review_check;

pub use balance_check::{balance_alert, BalanceCheckSettings, BalanceCheckTask};
pub use check::CheckResult;
pub use pr_review_check::{stale_pr_alert, PrReviewCheckTask, PrReviewSettings, WatchedRepo};
