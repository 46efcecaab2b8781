//! # Rollcall Core
//!
//! Shared building blocks for the attendance notifier: configuration,
//! the error taxonomy, domain types, and the traits that the record store
//! and messaging gateway clients implement.

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RollcallConfig;
pub use error::{Result, RollcallError};
pub use traits::{MessageGateway, RecordStore};
pub use types::{AttendanceSummary, ChangeEvent, Mark, Row, Student, SubjectKind, SubjectSource, TodayMark};
