//! Scheduler Engine — a small table of daily jobs ordered by next firing,
//! polled on a fixed interval by a background loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use rollcall_core::clock::Clock;
use rollcall_core::config::SchedulerConfig;
use rollcall_core::error::{Result, RollcallError};
use rollcall_engine::MessageKind;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::cron::parse_daily_time;
use crate::dispatch::Broadcaster;
use crate::tasks::Job;

/// The scheduler engine — holds jobs and decides which are due.
#[derive(Debug, Default)]
pub struct SchedulerEngine {
    /// Sorted by `next_fire`, earliest first.
    jobs: Vec<Job>,
}

impl SchedulerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The morning and evening broadcasts from configuration.
    pub fn from_config(config: &SchedulerConfig, now: NaiveDateTime) -> Result<Self> {
        let mut engine = Self::new();
        for (name, kind, spec) in [
            ("morning", MessageKind::Morning, &config.morning_at),
            ("evening", MessageKind::Evening, &config.evening_at),
        ] {
            let at = parse_daily_time(spec).ok_or_else(|| {
                RollcallError::Config(format!("invalid {name} trigger time '{spec}'"))
            })?;
            engine.add_job(Job::daily(name, kind, at, now));
        }
        Ok(engine)
    }

    pub fn add_job(&mut self, job: Job) {
        tracing::info!("📅 Job added: '{}' daily at {}", job.name, job.at.format("%H:%M"));
        self.jobs.push(job);
        self.sort();
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Mark every due job as fired and return them in firing order.
    /// Occurrences from an earlier calendar day are dropped, not replayed.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<Job> {
        let mut fired = Vec::new();
        let mut moved = false;
        for job in self.jobs.iter_mut() {
            if now < job.next_fire {
                break;
            }
            moved |= job.skip_stale(now);
            if job.is_due(now) {
                fired.push(job.clone());
                job.mark_fired(now);
            }
        }
        if moved || !fired.is_empty() {
            self.sort();
        }
        fired
    }

    fn sort(&mut self) {
        self.jobs.sort_by_key(|j| j.next_fire);
    }
}

/// Spawn the scheduler loop as a background tokio task.
/// A failing job is logged; the loop carries on to the next tick.
pub async fn spawn_scheduler(
    engine: Arc<Mutex<SchedulerEngine>>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
    poll_secs: u64,
) {
    tracing::info!("⏰ Scheduler started (check every {}s)", poll_secs);

    let mut interval = tokio::time::interval(Duration::from_secs(poll_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let due = {
            let mut eng = engine.lock().await;
            eng.take_due(clock.now())
        };

        for job in due {
            tracing::info!("--- Running Scheduled Job: {} at {} ---", job.name, clock.now());
            let runner = broadcaster.clone();
            let kind = job.kind;
            match tokio::spawn(async move { runner.run(kind).await }).await {
                Ok(Ok(report)) => tracing::info!("✅ Job '{}' finished: {:?}", job.name, report),
                Ok(Err(e)) => tracing::error!("❌ Error during scheduled job '{}': {e}", job.name),
                Err(e) => tracing::error!("❌ Scheduled job '{}' crashed: {e}", job.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 25)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_from_config_registers_two_jobs() {
        let engine = SchedulerEngine::from_config(&SchedulerConfig::default(), at(6, 0)).unwrap();
        let names: Vec<&str> = engine.jobs().iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["morning", "evening"]);
    }

    #[test]
    fn test_from_config_rejects_bad_time() {
        let config = SchedulerConfig {
            evening_at: "25:00".into(),
            ..SchedulerConfig::default()
        };
        assert!(SchedulerEngine::from_config(&config, at(6, 0)).is_err());
    }

    #[test]
    fn test_take_due_fires_each_job_once() {
        let mut engine =
            SchedulerEngine::from_config(&SchedulerConfig::default(), at(6, 0)).unwrap();

        assert!(engine.take_due(at(6, 59)).is_empty());

        let fired = engine.take_due(at(7, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, MessageKind::Morning);
        assert!(engine.take_due(at(7, 1)).is_empty());

        let fired = engine.take_due(at(16, 2));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, MessageKind::Evening);

        // Jobs re-sorted: tomorrow's morning comes first.
        assert_eq!(engine.jobs()[0].name, "morning");
        assert_eq!(engine.jobs()[0].next_fire, at(7, 0) + ChronoDuration::days(1));
    }

    #[test]
    fn test_stall_across_midnight_fires_once_per_day() {
        let mut engine =
            SchedulerEngine::from_config(&SchedulerConfig::default(), at(6, 0)).unwrap();
        let next_day = |h, m| at(h, m) + ChronoDuration::days(1);

        let fired = engine.take_due(next_day(7, 30));
        let kinds: Vec<MessageKind> = fired.iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Morning]);

        assert!(engine.take_due(next_day(15, 59)).is_empty());
        let fired = engine.take_due(next_day(16, 30));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, MessageKind::Evening);

        let evening = engine.jobs().iter().find(|j| j.name == "evening").unwrap();
        assert_eq!(evening.run_count, 1);
        assert_eq!(evening.last_fired, Some(next_day(0, 0).date()));
    }

    #[tokio::test]
    async fn test_loop_survives_failing_job() {
        use crate::test_support::{RecordingGateway, harness_with};
        use rollcall_core::clock::FixedClock;

        let (store, gateway, broadcaster) = harness_with(RecordingGateway::default());
        store.fail_table("studentsrecord");

        let engine = Arc::new(Mutex::new(
            SchedulerEngine::from_config(&SchedulerConfig::default(), at(6, 0)).unwrap(),
        ));
        let clock = Arc::new(FixedClock(at(17, 0)));
        let handle = tokio::spawn(spawn_scheduler(
            engine.clone(),
            Arc::new(broadcaster),
            clock,
            1,
        ));

        // First tick is immediate; the second arrives a second later.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!handle.is_finished());

        let runs: Vec<(String, u32)> = engine
            .lock()
            .await
            .jobs()
            .iter()
            .map(|j| (j.name.clone(), j.run_count))
            .collect();
        assert_eq!(runs, vec![("morning".to_string(), 1), ("evening".to_string(), 1)]);
        assert!(gateway.messages().is_empty());
        handle.abort();
    }

    #[test]
    fn test_busy_process_fires_both_overdue_jobs_once() {
        let mut engine =
            SchedulerEngine::from_config(&SchedulerConfig::default(), at(6, 0)).unwrap();
        let fired = engine.take_due(at(17, 0));
        assert_eq!(fired.len(), 2);
        assert!(engine.take_due(at(17, 1)).is_empty());
    }
}
