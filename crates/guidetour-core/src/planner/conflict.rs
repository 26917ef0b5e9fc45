//! Time-overlap conflicts between visits.
//!
//! Windows are half-open: a visit ending at 11:00 does not conflict with
//! one starting at 11:00.

use chrono::{NaiveDate, NaiveTime};

use crate::calendar::minute_of_day;
use crate::state::VisitBook;
use crate::visit::Visit;

/// Whether `[start_a, end_a)` and `[start_b, end_b)` intersect.
pub fn overlaps<T: PartialOrd>(start_a: T, end_a: T, start_b: T, end_b: T) -> bool {
    start_a < end_b && end_a > start_b
}

/// Overlap checks against the live visit set.
///
/// Cancelled visits and visits without a start time never conflict.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    visits: &'a VisitBook,
    ignored: Option<&'a str>,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(visits: &'a VisitBook) -> Self {
        Self {
            visits,
            ignored: None,
        }
    }

    /// Leave one visit out of every scan, typically the visit being
    /// re-validated.
    pub fn ignoring(mut self, visit_id: &'a str) -> Self {
        self.ignored = Some(visit_id);
        self
    }

    /// Whether `guide` leads nothing overlapping the candidate window.
    pub fn is_guide_free(
        &self,
        guide: &str,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
    ) -> bool {
        self.first_conflict(date, start, duration_minutes, |v| v.is_led_by(guide))
            .is_none()
    }

    /// Whether nothing at `place` overlaps the candidate window.
    pub fn is_place_free(
        &self,
        place: &str,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
    ) -> bool {
        self.first_conflict(date, start, duration_minutes, |v| v.place == place)
            .is_none()
    }

    /// First visit on `date`, selected by `scope`, whose window overlaps
    /// the candidate.
    pub fn first_conflict(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
        scope: impl Fn(&Visit) -> bool,
    ) -> Option<Visit> {
        let start = minute_of_day(start);
        let end = start.saturating_add(duration_minutes);
        self.visits
            .on_date(date)
            .into_iter()
            .filter(|v| !v.is_cancelled())
            .filter(|v| Some(v.id.as_str()) != self.ignored)
            .filter(|v| scope(v))
            .find(|v| match v.window() {
                Some((other_start, other_end)) => overlaps(start, end, other_start, other_end),
                None => false,
            })
    }
}
