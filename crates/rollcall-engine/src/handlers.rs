//! Reactions to record-store change events.
//!
//! - INSERT into the identity table → welcome message with the current recap.
//! - UPDATE of a subject table where today's column flips to absent → alert.
//!
//! Nothing here surfaces an error to the event source; every path ends in an
//! `EventOutcome` that the caller logs.

use std::sync::Arc;

use rollcall_channels::{Notifier, SendOutcome};
use rollcall_core::config::StoreConfig;
use rollcall_core::types::{ChangeEvent, Mark, Row, value_as_string};
use serde::Serialize;

use crate::aggregator::Aggregator;
use crate::format;

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum EventOutcome {
    Welcomed(SendOutcome),
    Alerted(SendOutcome),
    /// The event was relevant but no message was sent.
    Suppressed(String),
    /// Not an event this system reacts to.
    Ignored,
}

pub struct EventHandlers {
    aggregator: Arc<Aggregator>,
    notifier: Arc<Notifier>,
    identity_table: String,
    roll_column: String,
}

impl EventHandlers {
    pub fn new(aggregator: Arc<Aggregator>, notifier: Arc<Notifier>, layout: &StoreConfig) -> Self {
        Self {
            aggregator,
            notifier,
            identity_table: layout.identity_table.clone(),
            roll_column: layout.roll_column.clone(),
        }
    }

    /// Route one event to its handler.
    pub async fn handle(&self, event: &ChangeEvent) -> EventOutcome {
        let outcome = match event {
            ChangeEvent::Insert { table, record } if *table == self.identity_table => {
                self.on_registration(record).await
            }
            ChangeEvent::Update {
                table,
                record,
                old_record,
            } if self.aggregator.source(table).is_some() => {
                self.on_attendance_update(table, old_record, record).await
            }
            _ => EventOutcome::Ignored,
        };
        tracing::debug!("Event on {:?} → {:?}", event.table(), outcome);
        outcome
    }

    /// New student registered: send the welcome recap.
    pub async fn on_registration(&self, record: &Row) -> EventOutcome {
        let Some(roll_no) = self.roll_of(record) else {
            return EventOutcome::Suppressed("registration without roll number".into());
        };
        tracing::info!("New student registered: {roll_no}. Sending welcome message.");

        let summary = match self.aggregator.compute_summary(&roll_no).await {
            Ok(summary) => summary,
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!("Welcome for {roll_no} suppressed: {e}");
                }
                return EventOutcome::Suppressed(e.to_string());
            }
        };
        if !summary.has_data() {
            return EventOutcome::Suppressed(format!("no attendance data for {roll_no}"));
        }

        let body = format::welcome(&summary);
        EventOutcome::Welcomed(self.notifier.send(&roll_no, summary.address.as_deref(), &body).await)
    }

    /// Attendance row changed: alert only when today's mark becomes absent.
    pub async fn on_attendance_update(&self, table: &str, old: &Row, new: &Row) -> EventOutcome {
        let Some(source) = self.aggregator.source(table) else {
            return EventOutcome::Ignored;
        };
        let today = self.aggregator.today_column();
        if !became_absent(old, new, &today) {
            return EventOutcome::Ignored;
        }

        let Some(roll_no) = self.roll_of(new).or_else(|| self.roll_of(old)) else {
            return EventOutcome::Suppressed("attendance update without roll number".into());
        };
        let subject = source.display_name();
        tracing::info!("{roll_no} marked absent in {subject} on {today}");

        let student = match self.aggregator.store().student(&roll_no).await {
            Ok(Some(student)) => student,
            Ok(None) => {
                return EventOutcome::Suppressed(format!("no identity record for {roll_no}"));
            }
            Err(e) => {
                tracing::warn!("Absence alert for {roll_no} dropped: {e}");
                return EventOutcome::Suppressed(e.to_string());
            }
        };

        let body = format::absence_alert(&subject);
        EventOutcome::Alerted(self.notifier.send(&roll_no, student.address(), &body).await)
    }

    fn roll_of(&self, row: &Row) -> Option<String> {
        row.get(&self.roll_column)
            .and_then(value_as_string)
            .filter(|r| !r.trim().is_empty())
    }
}

/// Edge trigger: today's column is absent in `new` and was not absent in `old`.
/// Repeated delivery of the same update, or an update that leaves today's
/// column alone, never fires.
pub fn became_absent(old: &Row, new: &Row, today: &str) -> bool {
    Mark::in_row(new, today) == Some(Mark::Absent) && Mark::in_row(old, today) != Some(Mark::Absent)
}
