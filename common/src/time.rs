//! Calendar dates and clocks.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::error::CommonError;

/// Engine timing defaults.
pub mod constants {
    use super::Duration;

    /// Days searched backward from the requested date (30).
    pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

    /// Maximum age of the loaded rate table (6 hours).
    pub fn default_refresh_ttl() -> Duration {
        Duration::hours(6)
    }
}

/// Format used for rate dates.
pub const RATE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Parse the calendar date out of a stored or requested date string.
///
/// Only the leading `YYYY-MM-DD` is considered; anything after the tenth
/// character (a time of day, a zone suffix) is ignored.
pub fn parse_rate_date(text: &str) -> Result<NaiveDate, CommonError> {
    let trimmed = text.trim();
    let prefix = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(prefix, RATE_DATE_FORMAT)
        .map_err(|_| CommonError::InvalidDate(text.to_string()))
}

/// Render a date the way rate rows store it.
pub fn format_rate_date(date: NaiveDate) -> String {
    date.format(RATE_DATE_FORMAT).to_string()
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_date_plain() {
        let date = parse_rate_date("2023-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_rate_date_drops_time_of_day() {
        let date = parse_rate_date("2023-01-15T17:30:00Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());

        let date = parse_rate_date("2023-01-15 00:00:00").unwrap();
        assert_eq!(format_rate_date(date), "2023-01-15");
    }

    #[test]
    fn test_parse_rate_date_rejects_garbage() {
        assert!(parse_rate_date("").is_err());
        assert!(parse_rate_date("15/01/2023").is_err());
        assert!(parse_rate_date("2023-13-01").is_err());
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::hours(7));
        assert_eq!(clock.now() - start, Duration::hours(7));
    }
}
