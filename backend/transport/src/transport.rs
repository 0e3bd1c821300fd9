use reqwest::{Client, Request, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use watchdog_core::{CallContext, Result, WatchdogError};

use crate::retry::{classify_error, classify_status, Classification, RetryPolicy};

/// Longest error body kept in a [`WatchdogError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Outcome of one failed attempt.
enum Failure {
    Transient(WatchdogError),
    Permanent(WatchdogError),
}

/// Executes idempotent requests with bounded retries.
///
/// Cheap to share behind an `Arc`; holds no per-call state.
#[derive(Debug, Clone)]
pub struct RetryableTransport {
    client: Client,
    policy: RetryPolicy,
}

impl RetryableTransport {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request`, retrying transient failures until success, a permanent
    /// failure, exhaustion or the end of `ctx`.
    ///
    /// The request is rebuilt from a clone on every attempt, so its body must be
    /// replayable. On exhaustion the last attempt's error is returned.
    pub async fn execute(&self, ctx: &CallContext, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut attempt: u32 = 0;

        loop {
            ctx.check()?;
            let req = request.try_clone().ok_or_else(|| {
                WatchdogError::InvalidRequest("request body cannot be replayed".into())
            })?;

            let err = match self.attempt(ctx, req).await {
                Ok(response) => return Ok(response),
                Err(Failure::Permanent(err)) => return Err(err),
                Err(Failure::Transient(err)) => err,
            };

            if !self.policy.should_retry(attempt) {
                debug!(%method, host = url.host_str().unwrap_or(""), path = url.path(), attempts = attempt + 1, "Retries exhausted");
                return Err(err);
            }

            let backoff = self.policy.backoff_for(attempt);
            warn!(
                %method,
                host = url.host_str().unwrap_or(""),
                path = url.path(),
                attempt = attempt + 1,
                max_retries = self.policy.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Request failed, retrying"
            );
            ctx.sleep(backoff).await?;
            attempt += 1;
        }
    }

    /// [`execute`](Self::execute) followed by a JSON decode of the body.
    pub async fn get_json<T>(&self, ctx: &CallContext, request: Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(ctx, request).await?;
        let bytes = ctx.run(response.bytes()).await?.map_err(map_send_error)?;
        serde_json::from_slice(&bytes).map_err(|e| WatchdogError::Malformed(e.to_string()))
    }

    async fn attempt(&self, ctx: &CallContext, req: Request) -> std::result::Result<Response, Failure> {
        let response = match ctx.run(self.client.execute(req)).await {
            Err(reason) => return Err(Failure::Permanent(reason)),
            Ok(Err(e)) => {
                let transient = classify_error(&e) == Classification::Transient;
                let err = map_send_error(e);
                return Err(if transient {
                    Failure::Transient(err)
                } else {
                    Failure::Permanent(err)
                });
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        match classify_status(status) {
            Classification::Success => Ok(response),
            Classification::Transient => {
                // Drain so the pooled connection can be reused.
                if let Err(reason) = ctx.run(response.bytes()).await {
                    return Err(Failure::Permanent(reason));
                }
                Err(Failure::Transient(WatchdogError::Status {
                    status: status.as_u16(),
                    body: String::new(),
                }))
            }
            Classification::Permanent => {
                let body = match ctx.run(response.text()).await {
                    Err(reason) => return Err(Failure::Permanent(reason)),
                    Ok(Ok(text)) => truncate(&text),
                    Ok(Err(_)) => String::new(),
                };
                Err(Failure::Permanent(WatchdogError::Status {
                    status: status.as_u16(),
                    body,
                }))
            }
        }
    }
}

fn map_send_error(err: reqwest::Error) -> WatchdogError {
    if err.is_timeout() {
        WatchdogError::Timeout(err.to_string())
    } else if err.is_connect() {
        WatchdogError::Connect(err.to_string())
    } else if err.is_builder() {
        WatchdogError::InvalidRequest(err.to_string())
    } else {
        WatchdogError::Network(err.to_string())
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}
