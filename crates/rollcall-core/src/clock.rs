//! Wall-clock source. "Today" decides which dated column is current, so the
//! aggregator and event handlers share one injected clock.

use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, RollcallError};

pub trait Clock: Send + Sync {
    /// Current wall-clock time in the configured zone.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Server clock, optionally pinned to a fixed UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    /// Server local time.
    pub fn local() -> Self {
        Self { offset: None }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    /// Build from an optional `+HH:MM` / `-HH:MM` string.
    pub fn from_config(utc_offset: Option<&str>) -> Result<Self> {
        match utc_offset {
            Some(spec) => Ok(Self::with_offset(parse_utc_offset(spec)?)),
            None => Ok(Self::local()),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// Parse `+05:30`, `-04:00` or `Z`.
pub fn parse_utc_offset(spec: &str) -> Result<FixedOffset> {
    let spec = spec.trim();
    if spec.eq_ignore_ascii_case("z") || spec.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0)
            .ok_or_else(|| RollcallError::Config("invalid UTC offset".into()));
    }
    let invalid = || RollcallError::Config(format!("invalid UTC offset '{spec}' (expected +HH:MM)"));

    let (sign, rest) = match spec.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// A clock frozen at one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self(date.and_hms_opt(hour, minute, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
