//! Broadcast dispatch — one message per registered recipient, paced to
//! respect the messaging gateway's rate limits.

use std::sync::Arc;
use std::time::Duration;

use rollcall_channels::{Notifier, SendOutcome};
use rollcall_core::error::Result;
use rollcall_engine::{Aggregator, MessageKind};
use serde::Serialize;

/// Tally of one broadcast run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Recipients returned by the listing.
    pub listed: usize,
    pub sent: usize,
    /// No data, no theory classes yet, or no usable address.
    pub skipped: usize,
    pub failed: usize,
    /// Pacing waits taken; one per gateway call.
    pub paced: usize,
}

pub struct Broadcaster {
    aggregator: Arc<Aggregator>,
    notifier: Arc<Notifier>,
    pacing: Duration,
}

impl Broadcaster {
    pub fn new(aggregator: Arc<Aggregator>, notifier: Arc<Notifier>, pacing: Duration) -> Self {
        Self {
            aggregator,
            notifier,
            pacing,
        }
    }

    /// Send `kind` to every recipient. Only a failure to list recipients is
    /// an error; per-recipient problems are logged and counted.
    pub async fn run(&self, kind: MessageKind) -> Result<BroadcastReport> {
        let recipients = self.aggregator.store().list_recipients().await?;
        tracing::info!(
            "Found {} students to notify ({} job).",
            recipients.len(),
            kind.as_str()
        );

        let mut report = BroadcastReport {
            listed: recipients.len(),
            ..BroadcastReport::default()
        };

        for student in &recipients {
            let summary = match self.aggregator.compute_summary(&student.roll_no).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", student.roll_no);
                    report.skipped += 1;
                    continue;
                }
            };
            if summary.theory_total == 0 {
                tracing::debug!("Skipping {}: no theory classes recorded", student.roll_no);
                report.skipped += 1;
                continue;
            }

            let body = kind.render(&summary);
            let outcome = self.notifier.send(&student.roll_no, student.address(), &body).await;
            match &outcome {
                SendOutcome::Sent(_) => report.sent += 1,
                SendOutcome::Skipped => report.skipped += 1,
                SendOutcome::Failed(_) => report.failed += 1,
            }

            if outcome.attempted() {
                tokio::time::sleep(self.pacing).await;
                report.paced += 1;
            }
        }

        Ok(report)
    }
}
