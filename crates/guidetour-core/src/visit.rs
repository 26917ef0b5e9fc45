//! Visits and their lifecycle state.
//!
//! ```text
//!   PROPOSED <────> COMPLETE
//!      |  \           |  \
//!      |   \          |   +──> CANCELLED
//!      |    +──> CONFIRMED ──> HELD
//!      |            |
//!      +────────────+────────> CANCELLED
//! ```
//!
//! Administrative transitions:
//! - PROPOSED → COMPLETE | CONFIRMED | CANCELLED
//! - COMPLETE → PROPOSED | CONFIRMED | CANCELLED
//! - CONFIRMED → HELD | CANCELLED
//! - HELD, CANCELLED: terminal
//!
//! The lifecycle scheduler additionally moves past-dated visits to
//! CONFIRMED or CANCELLED by participant count.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::calendar::minute_of_day;

/// Lifecycle state of a visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisitState {
    /// Planned and open for reservations (initial state)
    #[default]
    Proposed,
    /// Every seat reserved
    Complete,
    /// Minimum participants reached, will take place
    Confirmed,
    /// Called off (terminal)
    Cancelled,
    /// Took place (terminal)
    Held,
}

impl VisitState {
    /// Check if an administrative transition is valid.
    pub fn can_transition_to(&self, to: &VisitState) -> bool {
        match self {
            VisitState::Proposed => matches!(
                to,
                VisitState::Complete | VisitState::Confirmed | VisitState::Cancelled
            ),
            VisitState::Complete => matches!(
                to,
                VisitState::Proposed | VisitState::Confirmed | VisitState::Cancelled
            ),
            VisitState::Confirmed => matches!(to, VisitState::Held | VisitState::Cancelled),
            VisitState::Cancelled | VisitState::Held => false,
        }
    }

    /// Terminal with respect to automatic transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VisitState::Held | VisitState::Cancelled)
    }

    /// Whether seats can still be reserved or released. Confirmed visits
    /// keep their booking as settled.
    pub fn accepts_reservations(&self) -> bool {
        matches!(self, VisitState::Proposed | VisitState::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitState::Proposed => "PROPOSED",
            VisitState::Complete => "COMPLETE",
            VisitState::Confirmed => "CONFIRMED",
            VisitState::Cancelled => "CANCELLED",
            VisitState::Held => "HELD",
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PROPOSED" => Ok(VisitState::Proposed),
            "COMPLETE" => Ok(VisitState::Complete),
            "CONFIRMED" => Ok(VisitState::Confirmed),
            "CANCELLED" => Ok(VisitState::Cancelled),
            "HELD" => Ok(VisitState::Held),
            other => Err(format!("unknown visit state: {other}")),
        }
    }
}

/// A guided tour instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub title: String,
    /// Place name
    pub place: String,
    /// Category names, ordered
    pub categories: BTreeSet<String>,
    /// Email of the assigned guide
    pub guide: Option<String>,
    pub date: NaiveDate,
    /// Unset until scheduled
    pub start: Option<NaiveTime>,
    pub duration_minutes: u32,
    /// Maximum participants
    pub capacity: u32,
    /// Participants required for the visit to be confirmed
    pub min_participants: u32,
    pub reserved_seats: u32,
    pub state: VisitState,
    pub ticket_required: bool,
    pub accessible: bool,
}

impl Visit {
    /// Create a proposed visit with a fresh id and no reservations.
    pub fn new(
        title: impl Into<String>,
        place: impl Into<String>,
        date: NaiveDate,
        start: Option<NaiveTime>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            place: place.into(),
            categories: BTreeSet::new(),
            guide: None,
            date,
            start,
            duration_minutes,
            capacity: 0,
            min_participants: 0,
            reserved_seats: 0,
            state: VisitState::Proposed,
            ticket_required: false,
            accessible: false,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_guide(mut self, guide: impl Into<String>) -> Self {
        self.guide = Some(guide.into());
        self
    }

    pub fn with_seats(mut self, capacity: u32, min_participants: u32) -> Self {
        self.capacity = capacity;
        self.min_participants = min_participants;
        self
    }

    pub fn with_reserved(mut self, reserved_seats: u32) -> Self {
        self.reserved_seats = reserved_seats;
        self
    }

    pub fn with_state(mut self, state: VisitState) -> Self {
        self.state = state;
        self
    }

    pub fn free_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.reserved_seats)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == VisitState::Cancelled
    }

    /// `[start, end)` in minutes since midnight, `None` when unscheduled.
    pub fn window(&self) -> Option<(u32, u32)> {
        self.start.map(|s| {
            let start = minute_of_day(s);
            (start, start.saturating_add(self.duration_minutes))
        })
    }

    /// Whether the visit is led by `guide`.
    pub fn is_led_by(&self, guide: &str) -> bool {
        self.guide.as_deref() == Some(guide)
    }

    /// State the lifecycle scheduler assigns once the visit date has passed.
    pub fn settled_state(&self) -> VisitState {
        if self.reserved_seats >= self.min_participants {
            VisitState::Confirmed
        } else {
            VisitState::Cancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Visit {
        Visit::new(
            "Old town walk",
            "Piazza Grande",
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0),
            90,
        )
        .with_seats(20, 5)
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        for to in [
            VisitState::Proposed,
            VisitState::Complete,
            VisitState::Confirmed,
            VisitState::Cancelled,
            VisitState::Held,
        ] {
            assert!(!VisitState::Held.can_transition_to(&to));
            assert!(!VisitState::Cancelled.can_transition_to(&to));
        }
    }

    #[test]
    fn window_end_saturates() {
        let mut visit = sample();
        assert_eq!(visit.window(), Some((600, 690)));
        visit.duration_minutes = u32::MAX;
        assert_eq!(visit.window(), Some((600, u32::MAX)));
    }

    #[test]
    fn only_open_states_accept_reservations() {
        assert!(VisitState::Proposed.accepts_reservations());
        assert!(VisitState::Complete.accepts_reservations());
        assert!(!VisitState::Confirmed.accepts_reservations());
    }

    #[test]
    fn confirmed_can_only_be_held_or_cancelled() {
        assert!(VisitState::Confirmed.can_transition_to(&VisitState::Held));
        assert!(VisitState::Confirmed.can_transition_to(&VisitState::Cancelled));
        assert!(!VisitState::Confirmed.can_transition_to(&VisitState::Proposed));
        assert!(!VisitState::Proposed.can_transition_to(&VisitState::Held));
    }

    #[test]
    fn state_parses_case_insensitively() {
        assert_eq!("confirmed".parse::<VisitState>(), Ok(VisitState::Confirmed));
        assert_eq!("HELD".parse::<VisitState>(), Ok(VisitState::Held));
        assert!("Effettuata".parse::<VisitState>().is_err());
    }

    #[test]
    fn state_serializes_uppercase() {
        let json = serde_json::to_string(&VisitState::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn free_seats_and_window() {
        let visit = sample().with_reserved(8);
        assert_eq!(visit.free_seats(), 12);
        assert_eq!(visit.window(), Some((600, 690)));
    }

    #[test]
    fn unscheduled_visit_has_no_window() {
        let mut visit = sample();
        visit.start = None;
        assert_eq!(visit.window(), None);
    }

    #[test]
    fn settled_state_depends_on_minimum() {
        assert_eq!(sample().with_reserved(5).settled_state(), VisitState::Confirmed);
        assert_eq!(sample().with_reserved(4).settled_state(), VisitState::Cancelled);
    }

    #[test]
    fn new_visits_get_distinct_ids() {
        assert_ne!(sample().id, sample().id);
    }
}
