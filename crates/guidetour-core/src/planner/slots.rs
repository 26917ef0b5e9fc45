//! Free start times for a place on a date.
//!
//! The search walks the fixed grid 09:00, 09:30, ... up to the last
//! permitted start (17:40) and keeps every candidate where the place is
//! free and the visit still ends by closing time. The grid holds at most
//! 18 candidates, so an exhaustive scan is fine.
//!
//! Blackout dates are not checked here; callers check them before
//! searching.

use chrono::{NaiveDate, NaiveTime};

use crate::calendar::{fits_in_day, time_at, LAST_START_MINUTE, OPENING_MINUTE, SLOT_STEP_MINUTES};
use crate::planner::conflict::ConflictDetector;

/// Whether any visit of `duration_minutes` fits between opening and
/// closing.
pub fn fits_operating_day(duration_minutes: u32) -> bool {
    fits_in_day(OPENING_MINUTE, duration_minutes)
}

/// Greedy slot search over the daily grid.
#[derive(Debug, Clone, Copy)]
pub struct SlotFinder<'a> {
    detector: ConflictDetector<'a>,
}

impl<'a> SlotFinder<'a> {
    pub fn new(detector: ConflictDetector<'a>) -> Self {
        Self { detector }
    }

    /// Grid start minutes that keep the visit inside opening hours.
    pub fn candidates(duration_minutes: u32) -> impl Iterator<Item = u32> {
        (OPENING_MINUTE..=LAST_START_MINUTE)
            .step_by(SLOT_STEP_MINUTES as usize)
            .filter(move |start| fits_in_day(*start, duration_minutes))
    }

    /// Free start times in time order.
    ///
    /// Empty when the duration cannot fit in the operating day at all.
    pub fn find_slots(&self, date: NaiveDate, place: &str, duration_minutes: u32) -> Vec<NaiveTime> {
        if !fits_operating_day(duration_minutes) {
            return Vec::new();
        }

        Self::candidates(duration_minutes)
            .filter_map(time_at)
            .filter(|start| {
                self.detector
                    .is_place_free(place, date, *start, duration_minutes)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VisitBook;
    use crate::visit::Visit;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, 4).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn empty_place_hour_long_visit() {
        let book = VisitBook::new();
        let slots = SlotFinder::new(ConflictDetector::new(&book)).find_slots(day(), "Museum", 60);

        let expected: Vec<_> = (0..18).map(|i| at(9 + i / 2, (i % 2) * 30)).collect();
        assert_eq!(slots, expected);
        assert_eq!(slots.first(), Some(&at(9, 0)));
        assert_eq!(slots.last(), Some(&at(17, 30)));
    }

    #[test]
    fn too_long_for_the_day_is_empty() {
        let book = VisitBook::new();
        let finder = SlotFinder::new(ConflictDetector::new(&book));
        assert!(finder.find_slots(day(), "Museum", 700).is_empty());
        assert!(!fits_operating_day(601));
        assert!(fits_operating_day(600));
    }

    #[test]
    fn huge_duration_finds_nothing() {
        let book = VisitBook::new();
        book.upsert(Visit::new("Tour", "Museum", day(), Some(at(10, 0)), 60));
        let finder = SlotFinder::new(ConflictDetector::new(&book));
        assert!(finder.find_slots(day(), "Museum", u32::MAX).is_empty());
        assert!(!fits_operating_day(u32::MAX));
        assert_eq!(SlotFinder::candidates(u32::MAX - 100).count(), 0);
    }

    #[test]
    fn whole_day_visit_has_single_slot() {
        let book = VisitBook::new();
        let slots = SlotFinder::new(ConflictDetector::new(&book)).find_slots(day(), "Museum", 600);
        assert_eq!(slots, vec![at(9, 0)]);
    }

    #[test]
    fn long_visits_drop_late_candidates() {
        let book = VisitBook::new();
        let slots = SlotFinder::new(ConflictDetector::new(&book)).find_slots(day(), "Museum", 120);
        assert_eq!(slots.last(), Some(&at(17, 0)));
        assert!(slots.iter().all(|s| crate::calendar::minute_of_day(*s) + 120 <= crate::calendar::CLOSING_MINUTE));
    }

    #[test]
    fn booked_window_is_skipped() {
        let book = VisitBook::new();
        book.upsert(Visit::new("Tour", "Museum", day(), Some(at(10, 0)), 90));
        book.upsert(Visit::new("Tour", "Gardens", day(), Some(at(14, 0)), 90));
        let slots = SlotFinder::new(ConflictDetector::new(&book)).find_slots(day(), "Museum", 60);

        // 09:00 ends at 10:00 and is free; 09:30 through 11:00 collide.
        assert!(slots.contains(&at(9, 0)));
        for blocked in [at(9, 30), at(10, 0), at(10, 30), at(11, 0)] {
            assert!(!slots.contains(&blocked), "{blocked} should be taken");
        }
        assert!(slots.contains(&at(11, 30)));
        assert!(slots.contains(&at(14, 0)));
    }

    #[test]
    fn slots_are_strictly_increasing() {
        let book = VisitBook::new();
        let slots = SlotFinder::new(ConflictDetector::new(&book)).find_slots(day(), "Museum", 45);
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }
}
