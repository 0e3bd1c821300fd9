use async_trait::async_trait;
use tracing::info;

use watchdog_core::{CallContext, Notifier, Result};

/// Logs alerts instead of delivering them. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, ctx: &CallContext, subject: &str, body: &str) -> Result<()> {
        ctx.check()?;
        info!(subject, body, "Dry run: alert not delivered");
        Ok(())
    }
}
