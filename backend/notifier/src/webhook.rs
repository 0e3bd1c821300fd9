//! Apprise API notifier.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use watchdog_core::{CallContext, Notifier, Result, WatchdogError};
use watchdog_logging::redact_url;
use watchdog_transport::RetryableTransport;

/// JSON body accepted by the Apprise `/notify` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApprisePayload<'a> {
    pub urls: &'a [String],
    pub title: &'a str,
    pub body: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub format: &'static str,
}

/// Sends alerts to every configured service through an Apprise API server.
///
/// The POST goes through the retrying transport. An ambiguous failure (e.g.
/// a 502 after Apprise already fanned out) can therefore deliver twice.
pub struct AppriseNotifier {
    transport: Arc<RetryableTransport>,
    api_url: String,
    service_urls: Vec<String>,
}

impl AppriseNotifier {
    pub fn new(
        transport: Arc<RetryableTransport>,
        api_url: impl Into<String>,
        service_urls: Vec<String>,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
            service_urls,
        }
    }
}

#[async_trait]
impl Notifier for AppriseNotifier {
    fn name(&self) -> &str {
        "apprise"
    }

    async fn send(&self, ctx: &CallContext, subject: &str, body: &str) -> Result<()> {
        if self.service_urls.is_empty() {
            return Err(WatchdogError::Notification(
                "no Apprise service URLs configured".into(),
            ));
        }

        let payload = ApprisePayload {
            urls: &self.service_urls,
            title: subject,
            body,
            kind: "info",
            format: "text",
        };
        let request = self
            .transport
            .client()
            .post(&self.api_url)
            .json(&payload)
            .build()
            .map_err(|e| WatchdogError::InvalidRequest(e.to_string()))?;

        match self.transport.execute(ctx, request).await {
            Ok(response) => {
                debug!(
                    api = %redact_url(&self.api_url),
                    services = self.service_urls.len(),
                    status = response.status().as_u16(),
                    "Notification sent"
                );
                Ok(())
            }
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => Err(WatchdogError::Notification(format!("apprise: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use watchdog_transport::{build_client, ClientOptions, RetryPolicy};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(server: &MockServer, services: Vec<String>) -> AppriseNotifier {
        let transport = RetryableTransport::new(
            build_client(&ClientOptions::default()).unwrap(),
            RetryPolicy {
                max_retries: 2,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
                multiplier: 2.0,
            },
        );
        AppriseNotifier::new(Arc::new(transport), format!("{}/notify", server.uri()), services)
    }

    #[tokio::test]
    async fn posts_apprise_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "urls": ["tgram://a/b", "discord://c/d"],
                "title": "Stale PR: Fix it",
                "body": "PR #1 in o/r by alice is pending review.",
                "type": "info",
                "format": "text"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier(&server, vec!["tgram://a/b".into(), "discord://c/d".into()]);
        let ctx = CallContext::new(CancellationToken::new());
        notifier
            .send(&ctx, "Stale PR: Fix it", "PR #1 in o/r by alice is pending review.")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejection_is_a_notification_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad urls"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier(&server, vec!["tgram://a/b".into()]);
        let ctx = CallContext::new(CancellationToken::new());
        let err = notifier.send(&ctx, "s", "b").await.unwrap_err();
        assert!(matches!(err, WatchdogError::Notification(ref m) if m.contains("400")));
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let notifier = notifier(&server, vec!["tgram://a/b".into()]);
        let ctx = CallContext::new(CancellationToken::new());
        assert!(notifier.send(&ctx, "s", "b").await.is_err());
    }

    #[tokio::test]
    async fn cancellation_passes_through() {
        let server = MockServer::start().await;
        let notifier = notifier(&server, vec!["tgram://a/b".into()]);
        let token = CancellationToken::new();
        token.cancel();
        let err = notifier
            .send(&CallContext::new(token), "s", "b")
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn no_services_fails_without_calling_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = notifier(&server, vec![]);
        let ctx = CallContext::new(CancellationToken::new());
        assert!(notifier.send(&ctx, "s", "b").await.is_err());
    }
}
