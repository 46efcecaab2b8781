//! Job definitions — one daily broadcast bound to a message kind.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rollcall_engine::MessageKind;
use serde::Serialize;

use crate::cron::next_fire_after;

/// A recurring daily job.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Human-readable name.
    pub name: String,
    /// Formatter used for every recipient.
    pub kind: MessageKind,
    /// Local wall-clock trigger time.
    pub at: NaiveTime,
    /// Next scheduled firing.
    pub next_fire: NaiveDateTime,
    /// Calendar day of the last occurrence served.
    pub last_fired: Option<NaiveDate>,
    /// How many times this job has fired.
    pub run_count: u32,
}

impl Job {
    /// A job firing daily at `at`, first after `now`.
    pub fn daily(name: &str, kind: MessageKind, at: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            name: name.to_string(),
            kind,
            at,
            next_fire: next_fire_after(at, now),
            last_fired: None,
            run_count: 0,
        }
    }

    /// Due once its trigger has elapsed, unless that day's occurrence already fired.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_fire && self.last_fired != Some(self.next_fire.date())
    }

    /// Drop an occurrence left over from an earlier calendar day, moving
    /// `next_fire` to today's slot. Returns whether anything was dropped.
    pub fn skip_stale(&mut self, now: NaiveDateTime) -> bool {
        if self.next_fire.date() >= now.date() {
            return false;
        }
        tracing::warn!(
            "Job '{}' missed its {} slot; next run {}",
            self.name,
            self.next_fire,
            now.date().and_time(self.at)
        );
        self.next_fire = now.date().and_time(self.at);
        true
    }

    /// Record a firing at `now` and move to the next occurrence after it.
    pub fn mark_fired(&mut self, now: NaiveDateTime) {
        self.last_fired = Some(self.next_fire.date());
        self.run_count += 1;
        self.next_fire = next_fire_after(self.at, now);
    }
}
