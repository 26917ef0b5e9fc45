//! Guide availability for the upcoming month.
//!
//! Guides declare the days they can lead visits during the first half of
//! the month (collection open while day-of-month ≤ close day, 15 by
//! default). Past the close day every guide gets a record, empty if they
//! declared nothing, and the whole snapshot is persisted so planners see
//! a frozen picture.
//!
//! Persistence is always a full replace of every guide's record.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::calendar::YearMonth;
use crate::catalog::Guide;
use crate::error::StoreError;
use crate::state::{AvailabilityBook, SharedState};
use crate::storage::Store;

/// Outcome of a [`AvailabilityEngine::sync`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Guides whose record was loaded from the store
    pub loaded: usize,
    /// Guides with no stored record
    pub defaulted: usize,
    /// Whether the snapshot was persisted
    pub persisted: bool,
    /// Store calls that failed and were skipped
    pub failures: usize,
}

/// Keeps the availability cache in step with the store.
pub struct AvailabilityEngine {
    state: Arc<SharedState>,
    store: Arc<dyn Store>,
    close_day: u32,
}

impl AvailabilityEngine {
    pub fn new(state: Arc<SharedState>, store: Arc<dyn Store>) -> Self {
        Self {
            state,
            store,
            close_day: 15,
        }
    }

    /// Last day of the month on which collection is open.
    pub fn with_close_day(mut self, close_day: u32) -> Self {
        self.close_day = close_day;
        self
    }

    fn cache(&self) -> &AvailabilityBook {
        &self.state.availability
    }

    /// Whether guides may still declare availability on `today`.
    pub fn is_open(&self, today: NaiveDate) -> bool {
        (1..=self.close_day).contains(&today.day())
    }

    /// Reload every guide's dates from the store.
    ///
    /// Past the close day, guides without a record get an empty one and
    /// the full snapshot plus the open flag are persisted.
    pub fn sync(&self, guides: &[Guide], today: NaiveDate) -> SyncReport {
        let mut report = SyncReport::default();

        for guide in guides {
            match self.store.load_availability(&guide.email) {
                Ok(Some(dates)) => {
                    self.cache().set(guide.email.clone(), dates.into_iter().collect());
                    report.loaded += 1;
                }
                Ok(None) => {
                    report.defaulted += 1;
                    if !self.cache().has_record(&guide.email) {
                        self.cache().set(guide.email.clone(), BTreeSet::new());
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(guide = %guide.email, error = %e, "failed to load availability");
                }
            }
        }

        if !self.is_open(today) {
            for guide in guides {
                self.cache().ensure_record(&guide.email);
            }
            match self.persist(today) {
                Ok(()) => report.persisted = true,
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(error = %e, "failed to persist availability snapshot");
                }
            }
        }

        tracing::debug!(
            loaded = report.loaded,
            defaulted = report.defaulted,
            persisted = report.persisted,
            "availability synced"
        );
        report
    }

    /// Days of `month` the guide declared.
    pub fn days_available_in_month(&self, guide: &str, month: YearMonth) -> Vec<u32> {
        self.cache().days_in(guide, month)
    }

    /// Replace the guide's dates and persist the full snapshot.
    ///
    /// The cache keeps the new dates even when persisting fails.
    pub fn save(
        &self,
        guide: &str,
        dates: impl IntoIterator<Item = NaiveDate>,
        today: NaiveDate,
    ) -> Result<(), StoreError> {
        self.cache().set(guide, dates.into_iter().collect());
        self.persist(today)
    }

    fn persist(&self, today: NaiveDate) -> Result<(), StoreError> {
        self.store.replace_availability(&self.cache().snapshot())?;
        self.store.set_availability_open(self.is_open(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn guides() -> Vec<Guide> {
        vec![
            Guide::new("anna@example.org", "Anna").with_categories(["historical"]),
            Guide::new("marco@example.org", "Marco").with_categories(["scientific"]),
        ]
    }

    fn setup() -> (Arc<SharedState>, Arc<MemoryStore>, AvailabilityEngine) {
        let state = Arc::new(SharedState::new());
        let store = Arc::new(MemoryStore::new());
        let engine = AvailabilityEngine::new(Arc::clone(&state), store.clone());
        (state, store, engine)
    }

    #[test]
    fn sync_before_close_day_only_loads() {
        let (state, store, engine) = setup();
        let mut snapshot = crate::storage::AvailabilitySnapshot::new();
        snapshot.insert("anna@example.org".into(), vec![date(2026, 11, 3)]);
        store.replace_availability(&snapshot).unwrap();

        let report = engine.sync(&guides(), date(2026, 10, 10));
        assert_eq!(report.loaded, 1);
        assert_eq!(report.defaulted, 1);
        assert!(!report.persisted);
        assert!(state.availability.get("marco@example.org").unwrap().is_empty());
        assert_eq!(store.availability_open().unwrap(), None);
        assert_eq!(store.availability_records(), 1);
    }

    #[test]
    fn sync_after_close_day_persists_every_guide() {
        let (_state, store, engine) = setup();
        let report = engine.sync(&guides(), date(2026, 10, 16));
        assert!(report.persisted);
        assert_eq!(store.availability_records(), 2);
        assert_eq!(store.load_availability("marco@example.org").unwrap(), Some(vec![]));
        assert_eq!(store.availability_open().unwrap(), Some(false));
    }

    #[test]
    fn save_replaces_and_persists() {
        let (_state, store, engine) = setup();
        engine
            .save("anna@example.org", [date(2026, 11, 3), date(2026, 11, 4)], date(2026, 10, 5))
            .unwrap();
        engine
            .save("anna@example.org", [date(2026, 11, 6)], date(2026, 10, 5))
            .unwrap();

        let november = YearMonth::new(2026, 11).unwrap();
        assert_eq!(engine.days_available_in_month("anna@example.org", november), vec![6]);
        assert_eq!(
            store.load_availability("anna@example.org").unwrap(),
            Some(vec![date(2026, 11, 6)])
        );
        assert_eq!(store.availability_open().unwrap(), Some(true));
    }

    #[test]
    fn open_window_follows_close_day() {
        let (_state, _store, engine) = setup();
        assert!(engine.is_open(date(2026, 10, 1)));
        assert!(engine.is_open(date(2026, 10, 15)));
        assert!(!engine.is_open(date(2026, 10, 16)));

        let (_state, _store, engine) = setup();
        let engine = engine.with_close_day(20);
        assert!(engine.is_open(date(2026, 10, 20)));
    }

    #[test]
    fn days_are_filtered_to_the_month() {
        let (_state, _store, engine) = setup();
        engine
            .save(
                "anna@example.org",
                [date(2026, 11, 30), date(2026, 12, 1)],
                date(2026, 10, 5),
            )
            .unwrap();
        let december = YearMonth::new(2026, 12).unwrap();
        assert_eq!(engine.days_available_in_month("anna@example.org", december), vec![1]);
    }
}
