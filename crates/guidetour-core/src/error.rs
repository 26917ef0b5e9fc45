//! Core error types for guidetour-core.
//!
//! Validation failures are ordinary values the caller reacts to (pick
//! another slot, another guide). Store failures are caught at the call
//! site by the background scheduler and logged.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::visit::VisitState;

/// Core error type for guidetour-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A candidate visit, assignment or reservation was rejected
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup of a keyed entity failed
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

impl CoreError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            key: key.into(),
        }
    }
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A persisted row could not be decoded
    #[error("Corrupt record in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    /// Store rejected the write (used by in-memory and test stores)
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Reasons a visit, assignment, reservation or availability request is
/// rejected.
///
/// `Display` yields the human-readable reason shown to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("visit has no start time")]
    MissingStartTime,

    #[error("guide {guide} already leads a visit overlapping {start} on {date}")]
    GuideBusy {
        guide: String,
        date: NaiveDate,
        start: NaiveTime,
    },

    #[error("place {place} is already booked around {start} on {date}")]
    PlaceBusy {
        place: String,
        date: NaiveDate,
        start: NaiveTime,
    },

    #[error("start time {0} is before opening time")]
    StartsBeforeOpening(NaiveTime),

    #[error("start time {0} is after the last permitted start")]
    StartsAfterLastStart(NaiveTime),

    #[error("visit would end after closing time")]
    EndsAfterClosing,

    #[error("a visit of {0} minutes does not fit in the opening hours")]
    DurationExceedsDay(u32),

    #[error("duration must be greater than zero")]
    EmptyDuration,

    #[error("no free slot at {place} on {date}")]
    NoFreeSlot { place: String, date: NaiveDate },

    #[error("visit in state {0} can no longer be changed")]
    VisitClosed(VisitState),

    #[error("{0} falls on a weekend")]
    Weekend(NaiveDate),

    #[error("{date} is a blackout date ({reason})")]
    Blackout { date: NaiveDate, reason: String },

    #[error("place {place} does not offer category {category}")]
    CategoryNotOffered { place: String, category: String },

    #[error("no place offers category {0}")]
    NoPlaceForCategory(String),

    #[error("visit must have at least one category")]
    NoCategories,

    #[error("guide {guide} is not qualified for any category of the visit")]
    GuideNotQualified { guide: String },

    #[error("minimum participants ({min}) exceeds capacity ({capacity})")]
    MinimumExceedsCapacity { min: u32, capacity: u32 },

    #[error("only {free} seats are free, {requested} requested")]
    NotEnoughSeats { free: u32, requested: u32 },

    #[error("cannot release {requested} seats, only {reserved} reserved")]
    NotEnoughReserved { reserved: u32, requested: u32 },

    #[error("visit in state {0} does not accept reservations")]
    ReservationsClosed(VisitState),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: VisitState, to: VisitState },

    #[error("built-in category {0} cannot be removed")]
    BuiltInCategory(String),

    #[error("{kind} {key} already exists")]
    Duplicate { kind: &'static str, key: String },

    #[error("availability collection is closed")]
    AvailabilityClosed,

    #[error("{0} is not an eligible day for this guide")]
    DateNotEligible(NaiveDate),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
