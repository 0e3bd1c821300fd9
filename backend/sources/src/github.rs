//! GitHub REST client for open pull requests and their CI signals.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Request;
use serde::Deserialize;
use tracing::debug;

use watchdog_core::{
    CallContext, CheckSuite, CiStatusSource, CommitStatus, PullRequest, PullRequestSource,
    RepoRef, Result, WatchdogError,
};
use watchdog_transport::RetryableTransport;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// GitHub REST API client.
pub struct GitHubClient {
    transport: Arc<RetryableTransport>,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct CheckSuitesResponse {
    #[serde(default)]
    check_suites: Vec<CheckSuite>,
}

impl GitHubClient {
    pub fn new(transport: Arc<RetryableTransport>) -> Self {
        Self {
            transport,
            base_url: "https://api.github.com".to_string(),
            token: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sends `Authorization: token <t>`; unauthenticated when `None`.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn get(&self, path: &str) -> Result<Request> {
        let mut builder = self
            .transport
            .client()
            .get(format!("{}{}", self.base_url, path))
            .header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("token {token}"));
        }
        builder
            .build()
            .map_err(|e| WatchdogError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn list_open_pull_requests(
        &self,
        ctx: &CallContext,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequest>> {
        let request = self.get(&format!(
            "/repos/{}/{}/pulls?state=open&per_page=100",
            repo.owner, repo.repo
        ))?;
        let pulls: Vec<PullRequest> = self.transport.get_json(ctx, request).await?;
        debug!(repo = %repo, count = pulls.len(), "Fetched open pull requests");
        Ok(pulls)
    }
}

#[async_trait]
impl CiStatusSource for GitHubClient {
    async fn commit_status(
        &self,
        ctx: &CallContext,
        repo: &RepoRef,
        sha: &str,
    ) -> Result<CommitStatus> {
        let request = self.get(&format!(
            "/repos/{}/{}/commits/{}/status",
            repo.owner, repo.repo, sha
        ))?;
        self.transport.get_json(ctx, request).await
    }

    async fn check_suites(
        &self,
        ctx: &CallContext,
        repo: &RepoRef,
        sha: &str,
    ) -> Result<Vec<CheckSuite>> {
        let request = self.get(&format!(
            "/repos/{}/{}/commits/{}/check-suites",
            repo.owner, repo.repo, sha
        ))?;
        let response: CheckSuitesResponse = self.transport.get_json(ctx, request).await?;
        Ok(response.check_suites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use watchdog_transport::{build_client, ClientOptions, RetryPolicy};
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> GitHubClient {
        let transport = RetryableTransport::new(
            build_client(&ClientOptions::default()).unwrap(),
            RetryPolicy {
                max_retries: 1,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(1),
                multiplier: 1.0,
            },
        );
        GitHubClient::new(Arc::new(transport))
            .with_base_url(server.uri())
            .with_token(token.map(String::from))
    }

    fn ctx() -> CallContext {
        CallContext::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn lists_pull_requests_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/signoz/signoz-web/pulls"))
            .and(query_param("state", "open"))
            .and(query_param("per_page", "100"))
            .and(header("accept", GITHUB_ACCEPT))
            .and(header("user-agent", "watchdog-app"))
            .and(header("authorization", "token ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "number": 456,
                    "title": "Docs refresh",
                    "user": {"login": "alice"},
                    "updated_at": "2024-01-02T03:04:05Z",
                    "draft": true,
                    "html_url": "https://github.com/signoz/signoz-web/pull/456",
                    "head": {"sha": "deadbeef"}
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let repo = RepoRef::new("signoz", "signoz-web");
        let pulls = client(&server, Some("ghp_test"))
            .list_open_pull_requests(&ctx(), &repo)
            .await
            .unwrap();

        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].number, 456);
        assert!(pulls[0].draft);
        assert_eq!(pulls[0].user.login, "alice");
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let pulls = client(&server, None)
            .list_open_pull_requests(&ctx(), &RepoRef::new("o", "r"))
            .await
            .unwrap();
        assert!(pulls.is_empty());
    }

    #[tokio::test]
    async fn reads_ci_signals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/commits/abc/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "failure", "statuses": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/commits/abc/check-suites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_count": 2,
                "check_suites": [
                    {"conclusion": "success"},
                    {"conclusion": null, "status": "queued"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, None);
        let repo = RepoRef::new("o", "r");
        let status = client.commit_status(&ctx(), &repo, "abc").await.unwrap();
        assert!(status.is_failing());

        let suites = client.check_suites(&ctx(), &repo, "abc").await.unwrap();
        assert_eq!(suites.len(), 2);
        assert!(!suites.iter().any(CheckSuite::is_failing));
    }

    #[tokio::test]
    async fn not_found_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .list_open_pull_requests(&ctx(), &RepoRef::new("o", "missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchdogError::Status { status: 404, .. }));
    }
}
