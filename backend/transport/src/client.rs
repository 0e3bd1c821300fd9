use std::time::Duration;

use reqwest::Client;
use watchdog_core::{Result, WatchdogError};

pub const DEFAULT_USER_AGENT: &str = "watchdog-app";

/// Knobs for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-attempt limit covering connect, headers and body.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Builds the single pooled client shared by every outbound integration.
pub fn build_client(options: &ClientOptions) -> Result<Client> {
    Client::builder()
        .timeout(options.request_timeout)
        .connect_timeout(options.connect_timeout)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(options.user_agent.clone())
        .build()
        .map_err(|e| WatchdogError::Config(format!("failed to build HTTP client: {e}")))
}
