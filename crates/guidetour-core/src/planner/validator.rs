//! Validation of candidate visits and guide assignments.

use chrono::{Datelike, NaiveDate};

use crate::calendar::{fits_in_day, minute_of_day, YearMonth, OPENING_MINUTE};
use crate::catalog::{Catalog, Guide};
use crate::error::ValidationError;
use crate::planner::conflict::ConflictDetector;
use crate::state::VisitBook;
use crate::visit::Visit;

/// Runs the conflict detector and calendar rules over a candidate.
#[derive(Debug, Clone, Copy)]
pub struct VisitValidator<'a> {
    visits: &'a VisitBook,
    catalog: &'a Catalog,
}

impl<'a> VisitValidator<'a> {
    pub fn new(visits: &'a VisitBook, catalog: &'a Catalog) -> Self {
        Self { visits, catalog }
    }

    /// Check that `guide` can lead `visit`.
    ///
    /// Checks run in order: start time present, guide free, start not
    /// before opening, end not after closing. The visit itself is left out
    /// of the busy check so an existing visit can be re-validated.
    pub fn validate_assignment(&self, visit: &Visit, guide: &str) -> Result<(), ValidationError> {
        let start = visit.start.ok_or(ValidationError::MissingStartTime)?;

        let detector = ConflictDetector::new(self.visits).ignoring(&visit.id);
        if !detector.is_guide_free(guide, visit.date, start, visit.duration_minutes) {
            return Err(ValidationError::GuideBusy {
                guide: guide.to_string(),
                date: visit.date,
                start,
            });
        }

        let start_minute = minute_of_day(start);
        if start_minute < OPENING_MINUTE {
            return Err(ValidationError::StartsBeforeOpening(start));
        }
        if !fits_in_day(start_minute, visit.duration_minutes) {
            return Err(ValidationError::EndsAfterClosing);
        }
        Ok(())
    }

    /// Whether `candidate` is free of same-date, same-place overlaps.
    pub fn validate_new_visit(&self, candidate: &Visit) -> bool {
        self.place_conflict(candidate).is_none()
    }

    /// The first existing visit at the candidate's place that overlaps it.
    pub fn place_conflict(&self, candidate: &Visit) -> Option<Visit> {
        let start = candidate.start?;
        ConflictDetector::new(self.visits)
            .ignoring(&candidate.id)
            .first_conflict(candidate.date, start, candidate.duration_minutes, |v| {
                v.place == candidate.place
            })
    }

    /// Days of `month` on which `guide` may declare availability.
    ///
    /// A day qualifies when no non-cancelled visit exists on it anywhere,
    /// and at least one of the guide's categories runs on that weekday.
    pub fn eligible_days_for_guide(&self, guide: &Guide, month: YearMonth) -> Vec<u32> {
        let categories = self.catalog.resolve_categories(&guide.categories);
        if categories.is_empty() {
            return Vec::new();
        }

        month
            .days()
            .into_iter()
            .filter(|date| categories.iter().any(|c| c.schedulable_on(*date)))
            .filter(|date| !self.has_active_visit(*date))
            .map(|date| date.day())
            .collect()
    }

    fn has_active_visit(&self, date: NaiveDate) -> bool {
        self.visits.on_date(date).iter().any(|v| !v.is_cancelled())
    }
}
