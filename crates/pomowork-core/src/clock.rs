//! Wall-clock access.
//!
//! The engine never reads the system time directly; it asks a [`Clock`].
//! Calendar-day keys are computed in local time, so a new local day means a
//! fresh daily stats entry and a fresh clutch quota.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDate};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Local>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `YYYY-MM-DD` for the local calendar day of `at`.
pub fn date_key(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Parse a key produced by [`date_key`].
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Local.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();
        clock.advance(Duration::seconds(90));
        assert_eq!(other.now(), start + Duration::seconds(90));
    }

    #[test]
    fn date_key_is_local_calendar_day() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(date_key(at), "2024-12-31");
        assert_eq!(
            parse_date_key("2024-12-31"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert!(parse_date_key("yesterday").is_none());
    }
}
