pub mod context;
pub mod error;
pub mod traits;
pub mod types;

pub use context::CallContext;
pub use error::{is_cancellation, is_retryable_status, Result, WatchdogError};
pub use traits::{
    BalanceSource, CiStatusSource, Clock, Notifier, PullRequestSource, SystemClock, Task,
};
pub use types::{CheckSuite, CommitStatus, Head, PullRequest, RepoRef, User};
