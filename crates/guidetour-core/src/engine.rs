//! Interactive entry point over the shared collections.
//!
//! [`TourEngine`] owns the in-memory state, the catalog and the store
//! handle. Every interactive operation validates against the current
//! snapshot, applies the change as an atomic replace-by-id and then
//! persists it. The lifecycle scheduler works on the same collections.

use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::availability::{AvailabilityEngine, SyncReport};
use crate::calendar::{
    fits_in_day, is_weekend, minute_of_day, YearMonth, LAST_START_MINUTE, OPENING_MINUTE,
};
use crate::catalog::{Catalog, Guide, Place, VisitCategory};
use crate::clock::Clock;
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::lifecycle::{Lifecycle, LifecycleScheduler, WorkerPool};
use crate::planner::{fits_operating_day, ConflictDetector, SlotFinder, VisitValidator};
use crate::state::SharedState;
use crate::storage::{Config, Store};
use crate::visit::{Visit, VisitState};

/// Counts from a bulk reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub visits: usize,
    pub blackouts: usize,
    pub places: usize,
    pub guides: usize,
    pub categories: usize,
    pub availability: SyncReport,
}

/// Request for [`TourEngine::plan_guided_visit`].
#[derive(Debug, Clone)]
pub struct GuidedVisitRequest {
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub min_participants: u32,
}

pub struct TourEngine {
    state: Arc<SharedState>,
    catalog: Arc<Catalog>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    availability: Arc<AvailabilityEngine>,
    lifecycle: Arc<Lifecycle>,
}

impl TourEngine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let state = Arc::new(SharedState::new());
        let catalog = Arc::new(Catalog::new());
        let availability = Arc::new(
            AvailabilityEngine::new(Arc::clone(&state), Arc::clone(&store))
                .with_close_day(config.availability.collection_close_day),
        );
        let lifecycle = Arc::new(Lifecycle::new(
            Arc::clone(&state),
            Arc::clone(&catalog),
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&availability),
        ));
        Self {
            state,
            catalog,
            store,
            clock,
            availability,
            lifecycle,
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Scheduler over this engine's collections.
    pub fn scheduler(&self, pool: WorkerPool) -> LifecycleScheduler {
        LifecycleScheduler::new(Arc::clone(&self.lifecycle), pool)
    }

    /// Replace every collection with the store's contents, then resync
    /// availability.
    pub fn load(&self) -> Result<LoadReport, StoreError> {
        let places = self.store.load_places()?;
        let guides = self.store.load_guides()?;
        let categories = self.store.load_categories()?;
        let visits = self.store.load_visits()?;
        let blackouts = self.store.load_blackout_dates()?;

        let mut report = LoadReport {
            visits: visits.len(),
            blackouts: blackouts.len(),
            places: places.len(),
            guides: guides.len(),
            categories: categories.len(),
            ..LoadReport::default()
        };

        self.catalog.replace_all(places, guides, categories);
        self.state.visits.replace_all(visits);
        self.state.blackouts.replace_all(blackouts);
        report.availability = self.lifecycle.sync_availability(self.today());

        tracing::info!(
            visits = report.visits,
            blackouts = report.blackouts,
            places = report.places,
            guides = report.guides,
            "state loaded"
        );
        Ok(report)
    }

    // ---- queries ----

    pub fn visit(&self, id: &str) -> Result<Visit> {
        self.state
            .visits
            .get(id)
            .ok_or_else(|| CoreError::not_found("visit", id))
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.state.visits.all()
    }

    pub fn visits_on(&self, date: NaiveDate) -> Vec<Visit> {
        self.state.visits.on_date(date)
    }

    pub fn visits_led_by(&self, guide: &str) -> Vec<Visit> {
        self.state.visits.matching(|v| v.is_led_by(guide))
    }

    pub fn blackout_dates(&self) -> BTreeMap<NaiveDate, String> {
        self.state.blackouts.all()
    }

    fn place(&self, name: &str) -> Result<Place> {
        self.catalog
            .place(name)
            .ok_or_else(|| CoreError::not_found("place", name))
    }

    fn guide(&self, email: &str) -> Result<Guide> {
        self.catalog
            .guide(email)
            .ok_or_else(|| CoreError::not_found("guide", email))
    }

    fn check_day(&self, date: NaiveDate) -> Result<(), ValidationError> {
        if is_weekend(date) {
            return Err(ValidationError::Weekend(date));
        }
        if let Some(reason) = self.state.blackouts.reason(date) {
            return Err(ValidationError::Blackout { date, reason });
        }
        Ok(())
    }

    fn check_duration(duration_minutes: u32) -> Result<(), ValidationError> {
        if duration_minutes == 0 {
            return Err(ValidationError::EmptyDuration);
        }
        if !fits_operating_day(duration_minutes) {
            return Err(ValidationError::DurationExceedsDay(duration_minutes));
        }
        Ok(())
    }

    // ---- slots and validation ----

    /// Free start times for `place` on `date`.
    ///
    /// Weekends and blackout dates are rejected before the search.
    pub fn find_slots(
        &self,
        date: NaiveDate,
        place: &str,
        duration_minutes: u32,
    ) -> Result<Vec<NaiveTime>> {
        self.place(place)?;
        Self::check_duration(duration_minutes)?;
        self.check_day(date)?;
        Ok(SlotFinder::new(ConflictDetector::new(&self.state.visits))
            .find_slots(date, place, duration_minutes))
    }

    /// Whether `candidate` is free of same-place overlaps.
    pub fn validate_new_visit(&self, candidate: &Visit) -> bool {
        VisitValidator::new(&self.state.visits, &self.catalog).validate_new_visit(candidate)
    }

    pub fn validate_assignment(&self, visit: &Visit, guide: &str) -> Result<(), ValidationError> {
        VisitValidator::new(&self.state.visits, &self.catalog).validate_assignment(visit, guide)
    }

    pub fn eligible_days_for_guide(&self, email: &str, month: YearMonth) -> Result<Vec<u32>> {
        let guide = self.guide(email)?;
        Ok(VisitValidator::new(&self.state.visits, &self.catalog)
            .eligible_days_for_guide(&guide, month))
    }

    // ---- availability ----

    /// Month guides are currently declaring availability for.
    pub fn availability_month(&self) -> YearMonth {
        YearMonth::of(self.today()).next()
    }

    pub fn availability_open(&self) -> bool {
        self.availability.is_open(self.today())
    }

    pub fn days_available(&self, email: &str, month: YearMonth) -> Vec<u32> {
        self.availability.days_available_in_month(email, month)
    }

    /// Replace the guide's declared days for next month.
    pub fn save_availability(&self, email: &str, dates: &[NaiveDate]) -> Result<()> {
        self.guide(email)?;
        let today = self.today();
        if !self.availability.is_open(today) {
            return Err(ValidationError::AvailabilityClosed.into());
        }

        let month = self.availability_month();
        let eligible = self.eligible_days_for_guide(email, month)?;
        if let Some(bad) = dates
            .iter()
            .find(|d| !month.contains(**d) || !eligible.contains(&d.day()))
        {
            return Err(ValidationError::DateNotEligible(*bad).into());
        }

        self.availability.save(email, dates.iter().copied(), today)?;
        tracing::info!(guide = email, days = dates.len(), %month, "availability saved");
        Ok(())
    }

    /// Guides qualified for `category` who declared `date`, sorted by email.
    pub fn guides_available_on(&self, date: NaiveDate, category: &str) -> Vec<Guide> {
        self.catalog
            .guides()
            .into_iter()
            .filter(|g| g.is_qualified_for(category))
            .filter(|g| {
                self.state
                    .availability
                    .get(&g.email)
                    .is_some_and(|days| days.contains(&date))
            })
            .collect()
    }

    // ---- planning ----

    /// Validate and commit a new visit.
    ///
    /// The visit is stored as Proposed. A guide already set on the draft is
    /// validated like [`TourEngine::assign_guide`] would.
    pub fn plan_visit(&self, mut draft: Visit) -> Result<Visit> {
        if self.state.visits.get(&draft.id).is_some() {
            return Err(ValidationError::Duplicate {
                kind: "visit",
                key: draft.id,
            }
            .into());
        }
        Self::check_duration(draft.duration_minutes)?;
        if draft.categories.is_empty() {
            return Err(ValidationError::NoCategories.into());
        }
        if draft.min_participants > draft.capacity {
            return Err(ValidationError::MinimumExceedsCapacity {
                min: draft.min_participants,
                capacity: draft.capacity,
            }
            .into());
        }
        if draft.reserved_seats > draft.capacity {
            return Err(ValidationError::NotEnoughSeats {
                free: draft.capacity,
                requested: draft.reserved_seats,
            }
            .into());
        }

        let place = self.place(&draft.place)?;
        for name in &draft.categories {
            if self.catalog.category(name).is_none() {
                return Err(CoreError::not_found("category", name.as_str()));
            }
            if !place.offers(name) {
                return Err(ValidationError::CategoryNotOffered {
                    place: place.name.clone(),
                    category: name.clone(),
                }
                .into());
            }
        }

        self.check_day(draft.date)?;
        let runs_that_day = self
            .catalog
            .resolve_categories(&draft.categories)
            .iter()
            .any(|c| c.schedulable_on(draft.date));
        if !runs_that_day {
            return Err(ValidationError::DateNotEligible(draft.date).into());
        }

        if let Some(start) = draft.start {
            let minute = minute_of_day(start);
            if minute < OPENING_MINUTE {
                return Err(ValidationError::StartsBeforeOpening(start).into());
            }
            if minute > LAST_START_MINUTE {
                return Err(ValidationError::StartsAfterLastStart(start).into());
            }
            if !fits_in_day(minute, draft.duration_minutes) {
                return Err(ValidationError::EndsAfterClosing.into());
            }
            if !self.validate_new_visit(&draft) {
                return Err(ValidationError::PlaceBusy {
                    place: draft.place.clone(),
                    date: draft.date,
                    start,
                }
                .into());
            }
        }

        if let Some(email) = draft.guide.clone() {
            self.check_guide_for(&draft, &email)?;
        }

        draft.state = VisitState::Proposed;
        if draft.capacity > 0 && draft.free_seats() == 0 {
            draft.state = VisitState::Complete;
        }
        self.state.visits.upsert(draft.clone());
        self.store.save_visit(&draft)?;
        tracing::info!(visit = %draft.id, place = %draft.place, date = %draft.date, "visit planned");
        Ok(draft)
    }

    /// Plan a visit for a category: first place offering it, first free
    /// slot, and the first available guide if one has declared the date.
    pub fn plan_guided_visit(&self, request: GuidedVisitRequest) -> Result<Visit> {
        let place = self
            .catalog
            .place_offering(&request.category)
            .ok_or_else(|| ValidationError::NoPlaceForCategory(request.category.clone()))?;
        let slots = self.find_slots(request.date, &place.name, request.duration_minutes)?;
        let Some(start) = slots.first().copied() else {
            return Err(ValidationError::NoFreeSlot {
                place: place.name,
                date: request.date,
            }
            .into());
        };

        let mut draft = Visit::new(
            request.title,
            place.name.clone(),
            request.date,
            Some(start),
            request.duration_minutes,
        )
        .with_categories([request.category.clone()])
        .with_seats(request.capacity, request.min_participants);

        let guide = self
            .guides_available_on(request.date, &request.category)
            .into_iter()
            .find(|g| self.validate_assignment(&draft, &g.email).is_ok());
        match guide {
            Some(g) => draft.guide = Some(g.email),
            None => tracing::debug!(
                category = %request.category,
                date = %request.date,
                "no available guide, visit left unassigned"
            ),
        }

        self.plan_visit(draft)
    }

    fn check_guide_for(&self, visit: &Visit, email: &str) -> Result<()> {
        let guide = self.guide(email)?;
        if !visit.categories.iter().any(|c| guide.is_qualified_for(c)) {
            return Err(ValidationError::GuideNotQualified {
                guide: email.to_string(),
            }
            .into());
        }
        self.validate_assignment(visit, email)?;
        Ok(())
    }

    /// Apply `f` atomically to the visit and persist the result.
    fn modify(
        &self,
        id: &str,
        f: impl FnOnce(&mut Visit) -> Result<(), ValidationError>,
    ) -> Result<Visit> {
        let updated = self
            .state
            .visits
            .update(id, f)
            .ok_or_else(|| CoreError::not_found("visit", id))??;
        self.store.save_visit(&updated)?;
        Ok(updated)
    }

    /// Assign `email` to lead the visit.
    pub fn assign_guide(&self, visit_id: &str, email: &str) -> Result<Visit> {
        let visit = self.visit(visit_id)?;
        if visit.state.is_terminal() {
            return Err(ValidationError::VisitClosed(visit.state).into());
        }
        self.check_guide_for(&visit, email)?;

        let updated = self.modify(visit_id, |v| {
            if v.state.is_terminal() {
                return Err(ValidationError::VisitClosed(v.state));
            }
            v.guide = Some(email.to_string());
            Ok(())
        })?;
        tracing::info!(visit = visit_id, guide = email, "guide assigned");
        Ok(updated)
    }

    /// Book `seats`. A visit with no seats left becomes Complete.
    pub fn reserve(&self, visit_id: &str, seats: u32) -> Result<Visit> {
        self.modify(visit_id, |v| {
            if !v.state.accepts_reservations() {
                return Err(ValidationError::ReservationsClosed(v.state));
            }
            let free = v.free_seats();
            if seats > free {
                return Err(ValidationError::NotEnoughSeats {
                    free,
                    requested: seats,
                });
            }
            v.reserved_seats += seats;
            if v.free_seats() == 0 {
                v.state = VisitState::Complete;
            }
            Ok(())
        })
    }

    /// Give back `seats`. A Complete visit with seats free again returns
    /// to Proposed. Once confirmed, the booking is frozen like `reserve`.
    pub fn release(&self, visit_id: &str, seats: u32) -> Result<Visit> {
        self.modify(visit_id, |v| {
            if !v.state.accepts_reservations() {
                return Err(ValidationError::ReservationsClosed(v.state));
            }
            if seats > v.reserved_seats {
                return Err(ValidationError::NotEnoughReserved {
                    reserved: v.reserved_seats,
                    requested: seats,
                });
            }
            v.reserved_seats -= seats;
            if v.state == VisitState::Complete && v.free_seats() > 0 {
                v.state = VisitState::Proposed;
            }
            Ok(())
        })
    }

    /// Administrative state change.
    pub fn transition(&self, visit_id: &str, to: VisitState) -> Result<Visit> {
        let updated = self.modify(visit_id, |v| {
            if !v.state.can_transition_to(&to) {
                return Err(ValidationError::InvalidTransition { from: v.state, to });
            }
            v.state = to;
            Ok(())
        })?;
        tracing::info!(visit = visit_id, state = %to, "visit state changed");
        Ok(updated)
    }

    // ---- blackout dates ----

    /// Returns whether the date was new. Adding an existing date is not an
    /// error and keeps the first reason.
    pub fn add_blackout_date(&self, date: NaiveDate, reason: &str) -> Result<bool> {
        self.store.add_blackout_date(date, reason)?;
        Ok(self.state.blackouts.insert(date, reason))
    }

    pub fn remove_blackout_date(&self, date: NaiveDate) -> Result<bool> {
        self.store.remove_blackout_date(date)?;
        Ok(self.state.blackouts.remove(date))
    }

    // ---- catalog ----

    fn check_categories<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        for name in names {
            if self.catalog.category(name).is_none() {
                return Err(CoreError::not_found("category", name.as_str()));
            }
        }
        Ok(())
    }

    pub fn register_place(&self, place: Place) -> Result<()> {
        self.check_categories(&place.categories)?;
        self.store.save_place(&place)?;
        tracing::debug!(place = %place.name, "place registered");
        self.catalog.put_place(place);
        Ok(())
    }

    pub fn register_guide(&self, guide: Guide) -> Result<()> {
        self.check_categories(&guide.categories)?;
        self.store.save_guide(&guide)?;
        tracing::debug!(guide = %guide.email, "guide registered");
        self.catalog.put_guide(guide);
        Ok(())
    }

    /// Add or replace a custom category.
    pub fn register_category(&self, mut category: VisitCategory) -> Result<()> {
        if self.catalog.category(&category.name).is_some_and(|c| c.built_in) {
            return Err(ValidationError::Duplicate {
                kind: "category",
                key: category.name,
            }
            .into());
        }
        category.built_in = false;
        self.store.save_category(&category)?;
        self.catalog.put_category(category);
        Ok(())
    }

    /// Remove a custom category. Returns whether it existed.
    pub fn remove_category(&self, name: &str) -> Result<bool> {
        let removed = self.catalog.remove_category(name)?;
        if removed {
            self.store.remove_category(name)?;
        }
        Ok(removed)
    }
}
