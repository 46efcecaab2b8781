//! Aggregator — reduces one student's rows across every subject table into
//! a single `AttendanceSummary`.
//!
//! A subject table without a row for the student is normal (not every
//! student takes every subject), so each fetch resolves to
//! `Result<Row, Absent>` and absent sources simply contribute nothing.
//! Only a missing identity record fails the whole aggregation.

use std::sync::Arc;

use futures::future::join_all;
use rollcall_core::clock::Clock;
use rollcall_core::error::{Result, RollcallError};
use rollcall_core::traits::RecordStore;
use rollcall_core::types::{
    AttendanceSummary, Mark, Row, SubjectSource, TodayMark, date_column, is_date_column,
};

/// Why a subject source contributed no row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absent {
    /// The student has no row in this table.
    NoRow,
    /// The lookup failed; treated the same as no row.
    Unavailable(String),
}

pub struct Aggregator {
    store: Arc<dyn RecordStore>,
    sources: Vec<SubjectSource>,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sources: Vec<SubjectSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sources,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn sources(&self) -> &[SubjectSource] {
        &self.sources
    }

    /// The configured subject source for `table`, if it is one.
    pub fn source(&self, table: &str) -> Option<&SubjectSource> {
        self.sources.iter().find(|s| s.key == table)
    }

    /// Column name holding today's marks.
    pub fn today_column(&self) -> String {
        date_column(self.clock.today())
    }

    /// Compute a fresh summary for `roll_no`. Fails with `NotFound` when the
    /// identity record does not exist.
    pub async fn compute_summary(&self, roll_no: &str) -> Result<AttendanceSummary> {
        tracing::debug!("Fetching data for Roll No: {roll_no}");
        let student = self
            .store
            .student(roll_no)
            .await?
            .ok_or_else(|| RollcallError::NotFound(format!("student {roll_no}")))?;

        let today = self.today_column();
        let rows = join_all(self.sources.iter().map(|s| self.fetch(s, roll_no))).await;

        let mut summary = AttendanceSummary::for_student(&student);
        for (source, row) in self.sources.iter().zip(rows) {
            match row {
                Ok(row) => tally_row(&mut summary, source, &row, &today),
                Err(Absent::NoRow) => {}
                Err(Absent::Unavailable(reason)) => {
                    tracing::debug!("{}: no data for {roll_no} ({reason})", source.key);
                }
            }
        }
        Ok(summary)
    }

    async fn fetch(&self, source: &SubjectSource, roll_no: &str) -> std::result::Result<Row, Absent> {
        match self.store.subject_row(&source.key, roll_no).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(Absent::NoRow),
            Err(e) => Err(Absent::Unavailable(e.to_string())),
        }
    }
}

/// Fold one subject row into `summary`.
///
/// Every dated column holding a recognized mark counts toward the source's
/// bucket; anything else (identity columns, nulls, unknown values) is
/// ignored. A mark in `today`'s column is also listed in `todays_marks`.
pub fn tally_row(summary: &mut AttendanceSummary, source: &SubjectSource, row: &Row, today: &str) {
    for (column, value) in row {
        if !is_date_column(column) {
            continue;
        }
        if let Some(mark) = Mark::from_value(value) {
            summary.record(source.kind, mark);
        }
    }

    if let Some(mark) = Mark::in_row(row, today) {
        summary.todays_marks.push(TodayMark {
            subject: source.display_name(),
            mark,
        });
    }
}
