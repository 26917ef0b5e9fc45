//! Automatic visit and blackout-date maintenance.
//!
//! A cycle has three passes:
//! - visits whose date has passed settle to Confirmed or Cancelled
//! - past blackout dates are pruned; on 1 January the fixed holidays of
//!   the new year are seeded
//! - guide availability is resynced with the store
//!
//! [`Lifecycle`] runs the passes synchronously. [`LifecycleScheduler`]
//! drives it from a background task on a [`WorkerPool`].
//!
//! A store failure is logged and the pass moves on to the next item; the
//! in-memory change is kept, so memory and store may drift until the next
//! reload.

pub mod worker;

pub use worker::WorkerPool;

use chrono::{Datelike, NaiveDate};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::availability::{AvailabilityEngine, SyncReport};
use crate::calendar::fixed_holidays;
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::state::SharedState;
use crate::storage::{SchedulerConfig, Store};
use crate::visit::VisitState;

/// Which passes a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSteps {
    pub visits: bool,
    pub blackouts: bool,
    pub availability: bool,
}

impl CycleSteps {
    pub const ALL: CycleSteps = CycleSteps {
        visits: true,
        blackouts: true,
        availability: true,
    };

    /// Steps of a periodic cycle.
    pub fn periodic(config: &SchedulerConfig) -> Self {
        Self {
            visits: config.periodic_visits,
            blackouts: config.periodic_blackouts,
            availability: config.periodic_availability,
        }
    }
}

impl Default for CycleSteps {
    fn default() -> Self {
        Self::periodic(&SchedulerConfig::default())
    }
}

/// What one cycle changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub today: Option<NaiveDate>,
    pub confirmed: usize,
    pub cancelled: usize,
    pub blackouts_pruned: usize,
    pub holidays_seeded: usize,
    pub guides_synced: usize,
    /// Store writes that failed
    pub failed: usize,
}

impl CycleReport {
    pub fn is_quiet(&self) -> bool {
        self.confirmed == 0
            && self.cancelled == 0
            && self.blackouts_pruned == 0
            && self.holidays_seeded == 0
            && self.failed == 0
    }
}

/// The maintenance passes over the shared collections.
pub struct Lifecycle {
    state: Arc<SharedState>,
    catalog: Arc<Catalog>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    availability: Arc<AvailabilityEngine>,
    cycles: AtomicU64,
}

impl Lifecycle {
    pub fn new(
        state: Arc<SharedState>,
        catalog: Arc<Catalog>,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        availability: Arc<AvailabilityEngine>,
    ) -> Self {
        Self {
            state,
            catalog,
            store,
            clock,
            availability,
            cycles: AtomicU64::new(0),
        }
    }

    /// Number of cycles completed since construction.
    pub fn cycles_run(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Run the selected passes against the clock's current date.
    pub fn run_cycle(&self, steps: CycleSteps) -> CycleReport {
        let today = self.clock.today();
        let mut report = CycleReport {
            today: Some(today),
            ..CycleReport::default()
        };

        if steps.visits {
            self.settle_past_visits(today, &mut report);
        }
        if steps.blackouts {
            self.maintain_blackouts(today, &mut report);
        }
        if steps.availability {
            let sync = self.sync_availability(today);
            report.guides_synced = sync.loaded + sync.defaulted;
            report.failed += sync.failures;
        }

        self.cycles.fetch_add(1, Ordering::Relaxed);
        if report.is_quiet() {
            tracing::debug!(%today, "lifecycle cycle: nothing to do");
        } else {
            tracing::info!(
                %today,
                confirmed = report.confirmed,
                cancelled = report.cancelled,
                blackouts_pruned = report.blackouts_pruned,
                holidays_seeded = report.holidays_seeded,
                failed = report.failed,
                "lifecycle cycle complete"
            );
        }
        report
    }

    fn settle_past_visits(&self, today: NaiveDate, report: &mut CycleReport) {
        let due = self
            .state
            .visits
            .matching(|v| v.date < today && !v.state.is_terminal());

        for visit in due {
            let target = visit.settled_state();
            if target == visit.state {
                continue;
            }

            // Re-read under the write lock; a reservation may have landed since.
            let updated = self.state.visits.update(&visit.id, |v| {
                if v.date >= today || v.state.is_terminal() {
                    return Err(());
                }
                let target = v.settled_state();
                if target == v.state {
                    return Err(());
                }
                v.state = target;
                Ok(())
            });
            let Some(Ok(updated)) = updated else {
                tracing::debug!(visit = %visit.id, "visit changed before settling, skipped");
                continue;
            };

            match updated.state {
                VisitState::Confirmed => report.confirmed += 1,
                _ => report.cancelled += 1,
            }
            if let Err(e) = self.store.save_visit(&updated) {
                report.failed += 1;
                tracing::warn!(visit = %updated.id, error = %e, "failed to persist settled visit");
            }
        }
    }

    fn maintain_blackouts(&self, today: NaiveDate, report: &mut CycleReport) {
        for date in self.state.blackouts.before(today) {
            if self.state.blackouts.remove(date) {
                report.blackouts_pruned += 1;
            }
            if let Err(e) = self.store.remove_blackout_date(date) {
                report.failed += 1;
                tracing::warn!(%date, error = %e, "failed to remove past blackout date");
            }
        }

        if today.month() == 1 && today.day() == 1 {
            for (date, reason) in fixed_holidays(today.year()) {
                if let Err(e) = self.store.add_blackout_date(date, &reason) {
                    report.failed += 1;
                    tracing::warn!(%date, error = %e, "failed to seed holiday");
                }
                if self.state.blackouts.insert(date, reason) {
                    report.holidays_seeded += 1;
                }
            }
        }
    }

    /// Resync every known guide's availability.
    pub fn sync_availability(&self, today: NaiveDate) -> SyncReport {
        self.availability.sync(&self.catalog.guides(), today)
    }
}

/// Drives [`Lifecycle`] cycles in the background.
pub struct LifecycleScheduler {
    lifecycle: Arc<Lifecycle>,
    pool: WorkerPool,
    periodic: Mutex<Option<AbortHandle>>,
}

impl LifecycleScheduler {
    pub fn new(lifecycle: Arc<Lifecycle>, pool: WorkerPool) -> Self {
        Self {
            lifecycle,
            pool,
            periodic: Mutex::new(None),
        }
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Run every pass now, on the calling thread.
    pub fn run_immediate_cycle(&self) -> CycleReport {
        self.lifecycle.run_cycle(CycleSteps::ALL)
    }

    /// Immediate full cycle in the background, then periodic cycles.
    pub fn start(&self, interval: Duration, steps: CycleSteps) {
        let lifecycle = Arc::clone(&self.lifecycle);
        self.pool.spawn_blocking("lifecycle-immediate", move || {
            lifecycle.run_cycle(CycleSteps::ALL);
        });
        self.start_periodic(interval, steps);
    }

    /// Spawn the periodic task. Returns `false` if one is already running
    /// or the pool is shut down.
    pub fn start_periodic(&self, interval: Duration, steps: CycleSteps) -> bool {
        let mut periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);
        if periodic.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::debug!("periodic lifecycle already running");
            return false;
        }

        let interval = interval.max(Duration::from_millis(1));
        let lifecycle = Arc::clone(&self.lifecycle);
        let handle = self.pool.spawn("lifecycle-periodic", async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let lifecycle = Arc::clone(&lifecycle);
                // A panicking pass surfaces as a JoinError; the loop survives it.
                if let Err(e) =
                    tokio::task::spawn_blocking(move || lifecycle.run_cycle(steps)).await
                {
                    tracing::error!(error = %e, "lifecycle cycle aborted");
                }
            }
        });

        match handle {
            Some(handle) => {
                tracing::info!(interval_ms = interval.as_millis() as u64, "periodic lifecycle started");
                *periodic = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Abort the periodic task. Returns `false` if none was running.
    pub fn stop_periodic(&self) -> bool {
        let handle = self
            .periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                tracing::info!("periodic lifecycle stopped");
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for LifecycleScheduler {
    fn drop(&mut self) {
        self.stop_periodic();
    }
}
