//! Calendar rules shared by every scheduling decision.
//!
//! - Operating day: opens 09:00, closes 19:00, last start 17:40
//! - Candidate starts are aligned to 30 minute steps
//! - Saturdays and Sundays are never eligible
//! - Fixed national holidays (see [`holidays`])
//!
//! Times are compared as minutes since midnight so that `start + duration`
//! never wraps around midnight the way `NaiveTime` arithmetic does.

pub mod holidays;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use holidays::fixed_holidays;

/// Opening time, 09:00.
pub const OPENING_MINUTE: u32 = 9 * 60;
/// Closing time, 19:00. A visit may end exactly at closing.
pub const CLOSING_MINUTE: u32 = 19 * 60;
/// Latest permitted start, 17:40.
pub const LAST_START_MINUTE: u32 = 17 * 60 + 40;
/// Slot granularity.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// Minutes since midnight for a wall-clock time (seconds are dropped).
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Wall-clock time for a minute offset, `None` past 23:59.
pub fn time_at(minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
}

/// Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether a window starting at `start` and lasting `duration_minutes`
/// fits inside opening hours.
pub fn fits_in_day(start_minute: u32, duration_minutes: u32) -> bool {
    start_minute >= OPENING_MINUTE
        && start_minute.saturating_add(duration_minutes) <= CLOSING_MINUTE
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// `None` unless `month` is 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Every date of the month, in order.
    pub fn days(self) -> Vec<NaiveDate> {
        let Some(first) = self.first_day() else {
            return Vec::new();
        };
        first
            .iter_days()
            .take_while(|d| d.month() == self.month)
            .collect()
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Date for a day-of-month, `None` if the day does not exist.
    pub fn day(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = String;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{s}'"))?;
        YearMonth::new(year, month).ok_or_else(|| format!("month out of range in '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekend_detection() {
        // 2026-10-17 is a Saturday
        assert!(is_weekend(date(2026, 10, 17)));
        assert!(is_weekend(date(2026, 10, 18)));
        assert!(!is_weekend(date(2026, 10, 19)));
        assert!(!is_weekend(date(2026, 10, 16)));
    }

    #[test]
    fn constants_match_operating_day() {
        assert_eq!(time_at(OPENING_MINUTE), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(time_at(CLOSING_MINUTE), NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(time_at(LAST_START_MINUTE), NaiveTime::from_hms_opt(17, 40, 0));
    }

    #[test]
    fn minute_round_trip() {
        let t = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert_eq!(minute_of_day(t), 870);
        assert_eq!(time_at(870), Some(t));
        assert_eq!(time_at(24 * 60), None);
    }

    #[test]
    fn fits_in_day_boundaries() {
        assert!(fits_in_day(OPENING_MINUTE, 600));
        assert!(!fits_in_day(OPENING_MINUTE, 601));
        assert!(!fits_in_day(OPENING_MINUTE - 1, 30));
        assert!(fits_in_day(18 * 60, 60));
        assert!(!fits_in_day(OPENING_MINUTE, u32::MAX));
    }

    #[test]
    fn year_month_navigation() {
        let dec = YearMonth::new(2026, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2027, 1).unwrap());
        assert_eq!(YearMonth::new(2024, 2).unwrap().days().len(), 29);
        assert_eq!(YearMonth::new(2026, 2).unwrap().days().len(), 28);
        assert!(YearMonth::new(2026, 13).is_none());
        assert!(dec.contains(date(2026, 12, 31)));
        assert!(!dec.contains(date(2027, 12, 1)));
    }

    #[test]
    fn year_month_parse_and_display() {
        let ym: YearMonth = "2026-03".parse().unwrap();
        assert_eq!(ym.to_string(), "2026-03");
        assert!("2026".parse::<YearMonth>().is_err());
        assert!("2026-00".parse::<YearMonth>().is_err());
    }
}
