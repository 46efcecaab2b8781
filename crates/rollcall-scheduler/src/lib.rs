//! # Rollcall Scheduler
//!
//! Fires the morning and evening broadcasts once per calendar day.
//!
//! ## Architecture
//! ```text
//! spawn_scheduler (tokio interval, default 60s)
//!   ├── Job "morning" 07:00 → Broadcaster::run(Morning)
//!   └── Job "evening" 16:00 → Broadcaster::run(Evening)
//!                                ├── list recipients
//!                                ├── per recipient: Aggregator → format → Notifier
//!                                └── pace after every gateway call
//! ```

pub mod cron;
pub mod dispatch;
pub mod engine;
pub mod tasks;

pub use dispatch::{BroadcastReport, Broadcaster};
pub use engine::{SchedulerEngine, spawn_scheduler};
pub use tasks::Job;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rollcall_channels::Notifier;
    use rollcall_core::clock::FixedClock;
    use rollcall_core::config::StoreConfig;
    use rollcall_core::error::{Result, RollcallError};
    use rollcall_core::traits::MessageGateway;
    use rollcall_core::types::{Row, SubjectSource};
    use rollcall_engine::Aggregator;
    use rollcall_store::MemoryStore;

    use crate::dispatch::Broadcaster;

    #[derive(Default)]
    pub struct RecordingGateway {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingGateway {
        pub fn messages(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageGateway for RecordingGateway {
        fn name(&self) -> &str {
            "recording"
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn send_text(&self, to: &str, body: &str) -> Result<String> {
            if self.fail {
                return Err(RollcallError::Gateway("HTTP 429".into()));
            }
            self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
            Ok("SM1".into())
        }
    }

    pub fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    pub fn harness_with(
        gateway: RecordingGateway,
    ) -> (Arc<MemoryStore>, Arc<RecordingGateway>, Broadcaster) {
        let store = Arc::new(MemoryStore::new(StoreConfig::default()));
        let gateway = Arc::new(gateway);
        let today = NaiveDate::from_ymd_opt(2025, 1, 25).unwrap();
        let aggregator = Arc::new(Aggregator::new(
            store.clone(),
            vec![
                SubjectSource::new("digital_electronics"),
                SubjectSource::new("digital_electronics_lab"),
            ],
            Arc::new(FixedClock::at(today, 16, 0)),
        ));
        let notifier = Arc::new(Notifier::new(gateway.clone()));
        let broadcaster = Broadcaster::new(aggregator, notifier, Duration::from_millis(1));
        (store, gateway, broadcaster)
    }
}
