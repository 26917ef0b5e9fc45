//! Fixed-date national holidays.
//!
//! Only holidays with a fixed calendar date are produced. Movable feasts
//! (Easter, Easter Monday) are not computed.

use chrono::NaiveDate;
use std::collections::BTreeMap;

const FIXED_HOLIDAYS: [(u32, u32, &str); 9] = [
    (1, 1, "New Year's Day"),
    (1, 6, "Epiphany"),
    (4, 25, "Liberation Day"),
    (5, 1, "Labour Day"),
    (8, 15, "Assumption Day"),
    (11, 1, "All Saints' Day"),
    (12, 8, "Immaculate Conception"),
    (12, 25, "Christmas Day"),
    (12, 26, "St. Stephen's Day"),
];

/// The fixed holidays of `year`, keyed by date.
pub fn fixed_holidays(year: i32) -> BTreeMap<NaiveDate, String> {
    FIXED_HOLIDAYS
        .iter()
        .filter_map(|&(month, day, reason)| {
            NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, reason.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_nine_holidays_in_the_requested_year() {
        let holidays = fixed_holidays(2027);
        assert_eq!(holidays.len(), 9);
        assert!(holidays.keys().all(|d| chrono::Datelike::year(d) == 2027));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(fixed_holidays(2030), fixed_holidays(2030));
    }

    #[test]
    fn includes_christmas_and_liberation_day() {
        let holidays = fixed_holidays(2026);
        let christmas = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let liberation = NaiveDate::from_ymd_opt(2026, 4, 25).unwrap();
        assert_eq!(holidays.get(&christmas).map(String::as_str), Some("Christmas Day"));
        assert!(holidays.contains_key(&liberation));
    }
}
