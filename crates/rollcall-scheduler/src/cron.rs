//! Daily trigger times.
//! Accepts "HH:MM" or the single-valued cron form "MIN HOUR * * *".
//! Example: "0 7 * * *" = every day at 07:00

use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Parse a daily trigger specification.
pub fn parse_daily_time(spec: &str) -> Option<NaiveTime> {
    let spec = spec.trim();
    if let Some((hour, minute)) = spec.split_once(':') {
        return time_of(hour, minute);
    }

    let parts: Vec<&str> = spec.split_whitespace().collect();
    if parts.len() != 5 {
        tracing::warn!("Invalid trigger time: '{}' (expected HH:MM or MIN HOUR * * *)", spec);
        return None;
    }
    if parts[2..].iter().any(|p| *p != "*") {
        tracing::warn!("Invalid trigger time: '{}' (only daily schedules are supported)", spec);
        return None;
    }
    time_of(parts[1], parts[0])
}

fn time_of(hour: &str, minute: &str) -> Option<NaiveTime> {
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// First occurrence of `at` strictly after `after`.
pub fn next_fire_after(at: NaiveTime, after: NaiveDateTime) -> NaiveDateTime {
    let candidate = after.date().and_time(at);
    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 25)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_clock_form() {
        let t = parse_daily_time("07:00").unwrap();
        assert_eq!((t.hour(), t.minute()), (7, 0));
        assert_eq!(parse_daily_time("16:30").unwrap().minute(), 30);
        assert!(parse_daily_time("24:00").is_none());
        assert!(parse_daily_time("7am").is_none());
    }

    #[test]
    fn test_parse_cron_form() {
        let t = parse_daily_time("0 16 * * *").unwrap();
        assert_eq!((t.hour(), t.minute()), (16, 0));
        assert!(parse_daily_time("0 16 * * 1").is_none());
        assert!(parse_daily_time("bad").is_none());
    }

    #[test]
    fn test_next_fire_same_day() {
        let seven = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        assert_eq!(next_fire_after(seven, at(6, 59)), at(7, 0));
    }

    #[test]
    fn test_next_fire_rolls_to_tomorrow() {
        let seven = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        let next = next_fire_after(seven, at(7, 0));
        assert_eq!(next, at(7, 0) + Duration::days(1));
        let next = next_fire_after(seven, at(10, 0));
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2025, 1, 26).unwrap());
    }
}
