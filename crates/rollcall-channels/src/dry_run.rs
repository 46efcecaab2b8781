//! Dry-run gateway: logs each message instead of sending it.

use async_trait::async_trait;
use rollcall_core::error::Result;
use rollcall_core::traits::MessageGateway;

pub struct LogGateway;

#[async_trait]
impl MessageGateway for LogGateway {
    fn name(&self) -> &str {
        "log"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        tracing::info!("[dry-run] → {to}\n{body}");
        Ok(format!("dry-run-{}", chrono::Utc::now().timestamp_millis()))
    }
}
