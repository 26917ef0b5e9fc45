//! # Guidetour Core Library
//!
//! This library provides the scheduling and validation engine for guided
//! tours. All operations are available through the standalone `guidetour`
//! CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Calendar rules**: opening hours, slot grid, weekends and fixed holidays
//! - **Planner**: conflict detection, slot search and visit validation
//! - **Availability**: monthly guide availability collection
//! - **Lifecycle**: background settlement of past visits and blackout dates
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`TourEngine`]: Interactive facade over the shared collections
//! - [`LifecycleScheduler`]: Periodic maintenance task
//! - [`TourDb`]: SQLite-backed [`Store`]
//! - [`Config`]: Application configuration management

pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod planner;
pub mod state;
pub mod storage;
pub mod visit;

pub use availability::{AvailabilityEngine, SyncReport};
pub use calendar::YearMonth;
pub use catalog::{Catalog, Guide, Place, VisitCategory};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{GuidedVisitRequest, LoadReport, TourEngine};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use lifecycle::{CycleReport, CycleSteps, Lifecycle, LifecycleScheduler, WorkerPool};
pub use planner::{ConflictDetector, SlotFinder, VisitValidator};
pub use state::SharedState;
pub use storage::{Config, MemoryStore, Store, TourDb};
pub use visit::{Visit, VisitState};
