//! In-memory collections shared by interactive callers and the lifecycle
//! scheduler.
//!
//! Each collection sits behind its own `RwLock`. Bulk reloads take the
//! write lock of that one collection; single-key updates are atomic
//! read-modify-write under the write lock. There are no transactions
//! spanning collections, so a multi-key invariant validated against one
//! snapshot may be outdated by the time it is committed.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use crate::calendar::YearMonth;
use crate::catalog::{read, write};
use crate::visit::Visit;

/// Visits keyed by id.
#[derive(Debug, Default)]
pub struct VisitBook {
    visits: RwLock<HashMap<String, Visit>>,
}

impl VisitBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Visit> {
        read(&self.visits).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.visits).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.visits).is_empty()
    }

    /// Snapshot of every visit, ordered by date, start and id.
    pub fn all(&self) -> Vec<Visit> {
        let mut visits: Vec<_> = read(&self.visits).values().cloned().collect();
        visits.sort_by(|a, b| (a.date, a.start, &a.id).cmp(&(b.date, b.start, &b.id)));
        visits
    }

    /// Snapshot of the visits on `date`.
    pub fn on_date(&self, date: NaiveDate) -> Vec<Visit> {
        self.matching(|v| v.date == date)
    }

    /// Snapshot of the visits accepted by `filter`, in [`VisitBook::all`] order.
    pub fn matching(&self, filter: impl Fn(&Visit) -> bool) -> Vec<Visit> {
        let mut visits: Vec<_> = read(&self.visits)
            .values()
            .filter(|v| filter(v))
            .cloned()
            .collect();
        visits.sort_by(|a, b| (a.date, a.start, &a.id).cmp(&(b.date, b.start, &b.id)));
        visits
    }

    /// Insert or replace by id.
    pub fn upsert(&self, visit: Visit) {
        write(&self.visits).insert(visit.id.clone(), visit);
    }

    /// Atomically apply `f` to the visit with `id`; returns the updated copy.
    ///
    /// `f` may reject the update, in which case the stored visit is
    /// left untouched.
    pub fn update<E>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Visit) -> Result<(), E>,
    ) -> Option<Result<Visit, E>> {
        let mut visits = write(&self.visits);
        let current = visits.get(id)?;
        let mut next = current.clone();
        Some(f(&mut next).map(|()| {
            visits.insert(id.to_string(), next.clone());
            next
        }))
    }

    /// Bulk reload.
    pub fn replace_all(&self, visits: Vec<Visit>) {
        let table = visits.into_iter().map(|v| (v.id.clone(), v)).collect();
        *write(&self.visits) = table;
    }
}

/// Blackout dates keyed by date.
#[derive(Debug, Default)]
pub struct BlackoutCalendar {
    dates: RwLock<BTreeMap<NaiveDate, String>>,
}

impl BlackoutCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reason for the blackout on `date`, if any.
    pub fn reason(&self, date: NaiveDate) -> Option<String> {
        read(&self.dates).get(&date).cloned()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        read(&self.dates).contains_key(&date)
    }

    pub fn all(&self) -> BTreeMap<NaiveDate, String> {
        read(&self.dates).clone()
    }

    /// Insert if absent. Returns whether the date was new.
    pub fn insert(&self, date: NaiveDate, reason: impl Into<String>) -> bool {
        let mut dates = write(&self.dates);
        if dates.contains_key(&date) {
            return false;
        }
        dates.insert(date, reason.into());
        true
    }

    pub fn remove(&self, date: NaiveDate) -> bool {
        write(&self.dates).remove(&date).is_some()
    }

    /// Dates strictly before `today`.
    pub fn before(&self, today: NaiveDate) -> Vec<NaiveDate> {
        read(&self.dates).range(..today).map(|(d, _)| *d).collect()
    }

    /// Bulk reload.
    pub fn replace_all(&self, dates: BTreeMap<NaiveDate, String>) {
        *write(&self.dates) = dates;
    }
}

/// Declared availability keyed by guide email.
#[derive(Debug, Default)]
pub struct AvailabilityBook {
    by_guide: RwLock<HashMap<String, BTreeSet<NaiveDate>>>,
}

impl AvailabilityBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guide: &str) -> Option<BTreeSet<NaiveDate>> {
        read(&self.by_guide).get(guide).cloned()
    }

    pub fn has_record(&self, guide: &str) -> bool {
        read(&self.by_guide).contains_key(guide)
    }

    /// Replace one guide's dates.
    pub fn set(&self, guide: impl Into<String>, dates: BTreeSet<NaiveDate>) {
        write(&self.by_guide).insert(guide.into(), dates);
    }

    /// Insert an empty record unless one exists. Returns whether it inserted.
    pub fn ensure_record(&self, guide: &str) -> bool {
        let mut by_guide = write(&self.by_guide);
        if by_guide.contains_key(guide) {
            return false;
        }
        by_guide.insert(guide.to_string(), BTreeSet::new());
        true
    }

    /// Days of `month` the guide declared.
    pub fn days_in(&self, guide: &str, month: YearMonth) -> Vec<u32> {
        use chrono::Datelike;
        read(&self.by_guide)
            .get(guide)
            .map(|dates| {
                dates
                    .iter()
                    .filter(|d| month.contains(**d))
                    .map(|d| d.day())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copy of every record, dates ordered.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<NaiveDate>> {
        read(&self.by_guide)
            .iter()
            .map(|(guide, dates)| (guide.clone(), dates.iter().copied().collect()))
            .collect()
    }
}

/// Every shared collection.
#[derive(Debug, Default)]
pub struct SharedState {
    pub visits: VisitBook,
    pub blackouts: BlackoutCalendar,
    pub availability: AvailabilityBook,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visit::VisitState;
    use chrono::NaiveTime;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn visit(d: NaiveDate) -> Visit {
        Visit::new("Tour", "Museum", d, NaiveTime::from_hms_opt(10, 0, 0), 60).with_seats(10, 2)
    }

    #[test]
    fn update_is_atomic_per_key() {
        let book = VisitBook::new();
        let v = visit(date(2026, 11, 2));
        let id = v.id.clone();
        book.upsert(v);

        let updated = book
            .update(&id, |v| {
                v.state = VisitState::Cancelled;
                Ok::<(), ()>(())
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.state, VisitState::Cancelled);
        assert_eq!(book.get(&id).unwrap().state, VisitState::Cancelled);
    }

    #[test]
    fn rejected_update_leaves_visit_untouched() {
        let book = VisitBook::new();
        let v = visit(date(2026, 11, 2));
        let id = v.id.clone();
        book.upsert(v);

        let result = book.update(&id, |v| {
            v.reserved_seats = 99;
            Err("nope")
        });
        assert_eq!(result, Some(Err("nope")));
        assert_eq!(book.get(&id).unwrap().reserved_seats, 0);
        assert!(book.update("missing", |_| Ok::<(), ()>(())).is_none());
    }

    #[test]
    fn concurrent_upserts_do_not_lose_keys() {
        let book = Arc::new(VisitBook::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let book = Arc::clone(&book);
                std::thread::spawn(move || {
                    for d in 1..=10 {
                        book.upsert(visit(date(2026, 1 + i, d)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(book.len(), 80);
    }

    #[test]
    fn blackout_insert_is_idempotent() {
        let calendar = BlackoutCalendar::new();
        assert!(calendar.insert(date(2026, 12, 25), "Christmas Day"));
        assert!(!calendar.insert(date(2026, 12, 25), "Other reason"));
        assert_eq!(calendar.all().len(), 1);
        assert_eq!(calendar.reason(date(2026, 12, 25)).as_deref(), Some("Christmas Day"));
    }

    #[test]
    fn blackout_before_is_strict() {
        let calendar = BlackoutCalendar::new();
        calendar.insert(date(2026, 10, 15), "a");
        calendar.insert(date(2026, 10, 16), "b");
        assert_eq!(calendar.before(date(2026, 10, 16)), vec![date(2026, 10, 15)]);
    }

    #[test]
    fn availability_days_are_filtered_by_month() {
        let book = AvailabilityBook::new();
        book.set(
            "anna@example.org",
            [date(2026, 11, 3), date(2026, 11, 20), date(2026, 12, 1)].into(),
        );
        let nov = YearMonth::new(2026, 11).unwrap();
        assert_eq!(book.days_in("anna@example.org", nov), vec![3, 20]);
        assert!(book.days_in("nobody@example.org", nov).is_empty());
    }

    #[test]
    fn ensure_record_keeps_existing_dates() {
        let book = AvailabilityBook::new();
        book.set("anna@example.org", [date(2026, 11, 3)].into());
        assert!(!book.ensure_record("anna@example.org"));
        assert!(book.ensure_record("marco@example.org"));
        assert_eq!(book.get("anna@example.org").unwrap().len(), 1);
        assert!(book.get("marco@example.org").unwrap().is_empty());
    }
}
