use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Dedup key for one pull request, e.g. `signoz/signoz-web#456`.
    pub fn pull_request_key(&self, number: u64) -> String {
        format!("{}/{}#{}", self.owner, self.repo, number)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// An open pull request, with only the fields monitoring cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub user: User,
    /// Last activity (commits, comments, reviews). Staleness is measured from here.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub draft: bool,
    pub html_url: String,
    pub head: Head,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Head {
    pub sha: String,
}

/// Combined legacy commit status (CircleCI, Jenkins, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitStatus {
    /// `success`, `pending`, `failure` or `error`.
    pub state: String,
}

impl CommitStatus {
    pub fn is_failing(&self) -> bool {
        matches!(self.state.as_str(), "failure" | "error")
    }
}

/// A check suite (GitHub Actions and friends).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSuite {
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl CheckSuite {
    pub fn is_failing(&self) -> bool {
        matches!(
            self.conclusion.as_deref(),
            Some("failure" | "timed_out" | "cancelled")
        )
    }
}
