//! Interactive planning: conflict detection, slot search and validation.
//!
//! - [`conflict`]: half-open interval overlap against the live visit set
//! - [`slots`]: free start times on the 30 minute grid
//! - [`validator`]: assignment, new-visit and eligible-day checks

pub mod conflict;
pub mod slots;
pub mod validator;

pub use conflict::{overlaps, ConflictDetector};
pub use slots::{fits_operating_day, SlotFinder};
pub use validator::VisitValidator;
