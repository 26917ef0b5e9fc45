//! Persistence boundary.
//!
//! The engine works on in-memory collections and records its decisions
//! through [`Store`]. Two adapters ship with the crate:
//!
//! - [`MemoryStore`]: lock-protected maps, for tests and embedding
//! - [`TourDb`]: SQLite at `~/.config/guidetour/guidetour.db`

mod config;
pub mod memory;
pub mod tour_db;

pub use config::{AvailabilityConfig, Config, SchedulerConfig, StorageConfig};
pub use memory::MemoryStore;
pub use tour_db::TourDb;

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::{Guide, Place, VisitCategory};
use crate::error::{ConfigError, StoreError};
use crate::visit::Visit;

/// Snapshot of every guide's declared dates, keyed by guide email.
pub type AvailabilitySnapshot = BTreeMap<String, Vec<NaiveDate>>;

/// Persisted store consumed by the engine.
///
/// Implementations must be usable from the scheduler task and interactive
/// threads at once.
pub trait Store: Send + Sync {
    fn load_visits(&self) -> Result<Vec<Visit>, StoreError>;

    /// Insert or replace by id.
    fn save_visit(&self, visit: &Visit) -> Result<(), StoreError>;

    fn load_blackout_dates(&self) -> Result<BTreeMap<NaiveDate, String>, StoreError>;

    /// Idempotent: adding an existing date succeeds and keeps one entry.
    fn add_blackout_date(&self, date: NaiveDate, reason: &str) -> Result<(), StoreError>;

    fn remove_blackout_date(&self, date: NaiveDate) -> Result<(), StoreError>;

    /// `None` when the guide has no record at all.
    fn load_availability(&self, guide: &str) -> Result<Option<Vec<NaiveDate>>, StoreError>;

    /// Delete every record, then insert `snapshot`.
    fn replace_availability(&self, snapshot: &AvailabilitySnapshot) -> Result<(), StoreError>;

    fn set_availability_open(&self, open: bool) -> Result<(), StoreError>;

    /// `None` until the flag has been written once.
    fn availability_open(&self) -> Result<Option<bool>, StoreError>;

    fn load_places(&self) -> Result<Vec<Place>, StoreError>;

    fn save_place(&self, place: &Place) -> Result<(), StoreError>;

    fn load_guides(&self) -> Result<Vec<Guide>, StoreError>;

    fn save_guide(&self, guide: &Guide) -> Result<(), StoreError>;

    /// Custom categories; built-ins are never persisted.
    fn load_categories(&self) -> Result<Vec<VisitCategory>, StoreError>;

    fn save_category(&self, category: &VisitCategory) -> Result<(), StoreError>;

    fn remove_category(&self, name: &str) -> Result<(), StoreError>;
}

/// Returns `~/.config/guidetour[-dev]/` based on GUIDETOUR_ENV.
///
/// Set GUIDETOUR_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GUIDETOUR_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("guidetour-dev")
    } else {
        base_dir.join("guidetour")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
