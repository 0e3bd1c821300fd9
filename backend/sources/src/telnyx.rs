use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use watchdog_core::{BalanceSource, CallContext, Result, WatchdogError};
use watchdog_transport::RetryableTransport;

/// Reads the account balance from the Telnyx v2 balance endpoint.
pub struct TelnyxClient {
    transport: Arc<RetryableTransport>,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    data: BalanceData,
}

#[derive(Deserialize)]
struct BalanceData {
    /// Decimal string, e.g. `"25.50"`.
    balance: String,
    #[serde(default)]
    currency: Option<String>,
}

impl TelnyxClient {
    pub fn new(
        transport: Arc<RetryableTransport>,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl BalanceSource for TelnyxClient {
    async fn get_balance(&self, ctx: &CallContext) -> Result<f64> {
        let request = self
            .transport
            .client()
            .get(&self.api_url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .build()
            .map_err(|e| WatchdogError::InvalidRequest(e.to_string()))?;

        let response: BalanceResponse = self.transport.get_json(ctx, request).await?;
        let balance: f64 = response.data.balance.trim().parse().map_err(|_| {
            WatchdogError::Malformed(format!(
                "balance {:?} is not a number",
                response.data.balance
            ))
        })?;
        if !balance.is_finite() {
            return Err(WatchdogError::Malformed(format!(
                "balance {:?} is not finite",
                response.data.balance
            )));
        }

        debug!(
            balance,
            currency = response.data.currency.as_deref().unwrap_or("USD"),
            "Fetched Telnyx balance"
        );
        Ok(balance)
    }
}
