//! # Rollcall Engine
//!
//! The attendance core: reconcile per-subject tables into one summary,
//! render it as a message, and react to record-store change events.
//!
//! ```text
//! change event ──► EventHandlers ──► Aggregator ──► format ──► Notifier
//! scheduler    ──────────────────► Aggregator ──► format ──► Notifier
//! ```

pub mod aggregator;
pub mod format;
pub mod handlers;

pub use aggregator::{Absent, Aggregator};
pub use format::MessageKind;
pub use handlers::{EventHandlers, EventOutcome};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rollcall_core::config::StoreConfig;
    use rollcall_core::error::{Result, RollcallError};
    use rollcall_core::traits::MessageGateway;
    use rollcall_core::types::Row;
    use rollcall_store::MemoryStore;

    /// Gateway that remembers every message and can be told to fail.
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
                return Err(RollcallError::Gateway("HTTP 503".into()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((to.to_string(), body.to_string()));
            Ok(format!("SM{}", sent.len()))
        }
    }

    pub fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 25).unwrap()
    }

    pub fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(StoreConfig::default()))
    }
}
