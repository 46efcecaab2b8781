//! Notifier — sends one body to one recipient and never lets a gateway
//! failure escape. Keeps outcome counters and a short delivery history.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rollcall_core::traits::MessageGateway;
use serde::Serialize;

const HISTORY_LIMIT: usize = 100;

/// Result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum SendOutcome {
    /// Accepted by the gateway; carries the gateway message id.
    Sent(String),
    /// No address to send to.
    Skipped,
    /// Gateway rejected or was unreachable.
    Failed(String),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// Whether the gateway was actually called.
    pub fn attempted(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Running outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// One entry of the delivery history. Bodies are not retained.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRecord {
    /// Roll number (or other label) the message was meant for.
    pub recipient: String,
    pub address: Option<String>,
    #[serde(flatten)]
    pub outcome: SendOutcome,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Ledger {
    stats: DeliveryStats,
    history: VecDeque<DeliveryRecord>,
}

/// Thin wrapper over a `MessageGateway`.
pub struct Notifier {
    gateway: Arc<dyn MessageGateway>,
    ledger: Mutex<Ledger>,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self {
            gateway,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    /// Send `body` to `recipient` at `address`. A missing or blank address
    /// is `Skipped`; gateway errors are logged and returned as `Failed`.
    pub async fn send(&self, recipient: &str, address: Option<&str>, body: &str) -> SendOutcome {
        let address = address.map(str::trim).filter(|a| !a.is_empty());

        let outcome = match address {
            None => {
                tracing::info!("Cannot send message to {recipient}, no WhatsApp number provided.");
                SendOutcome::Skipped
            }
            Some(to) => match self.gateway.send_text(to, body).await {
                Ok(id) => {
                    tracing::info!("✅ Message sent to {recipient} ({to}) via {}", self.gateway.name());
                    SendOutcome::Sent(id)
                }
                Err(e) => {
                    tracing::warn!("❌ Failed to send message to {recipient} ({to}). Reason: {e}");
                    SendOutcome::Failed(e.to_string())
                }
            },
        };

        self.record(recipient, address, &outcome);
        outcome
    }

    fn record(&self, recipient: &str, address: Option<&str>, outcome: &SendOutcome) {
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        match outcome {
            SendOutcome::Sent(_) => ledger.stats.sent += 1,
            SendOutcome::Skipped => ledger.stats.skipped += 1,
            SendOutcome::Failed(_) => ledger.stats.failed += 1,
        }
        ledger.history.push_back(DeliveryRecord {
            recipient: recipient.to_string(),
            address: address.map(str::to_string),
            outcome: outcome.clone(),
            timestamp: Utc::now(),
        });
        if ledger.history.len() > HISTORY_LIMIT {
            ledger.history.pop_front();
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner()).stats
    }

    /// Most recent deliveries, newest last.
    pub fn history(&self) -> Vec<DeliveryRecord> {
        let ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        ledger.history.iter().cloned().collect()
    }
}
