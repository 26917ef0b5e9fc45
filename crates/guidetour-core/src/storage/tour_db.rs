//! SQLite-based storage for visits, blackout dates, availability and the
//! catalog.
//!
//! Dates are stored as `YYYY-MM-DD`, times as `HH:MM`, category sets as
//! JSON arrays. Rows that fail to decode are logged and skipped so one bad
//! record cannot block a full load.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{data_dir, AvailabilitySnapshot, Store};
use crate::catalog::{Guide, Place, VisitCategory};
use crate::error::{CoreError, StoreError};
use crate::visit::{Visit, VisitState};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const AVAILABILITY_OPEN_KEY: &str = "availability_open";

// === Helper Functions ===

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(table: &'static str, s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| StoreError::Corrupt {
        table,
        message: format!("bad date '{s}': {e}"),
    })
}

fn parse_time(s: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|e| StoreError::Corrupt {
        table: "visits",
        message: format!("bad start time '{s}': {e}"),
    })
}

fn parse_state(s: &str) -> Result<VisitState, StoreError> {
    s.parse().map_err(|message| StoreError::Corrupt {
        table: "visits",
        message,
    })
}

fn encode_set(set: &BTreeSet<String>) -> Result<String, StoreError> {
    serde_json::to_string(set).map_err(|e| StoreError::QueryFailed(e.to_string()))
}

fn decode_set(table: &'static str, json: &str) -> Result<BTreeSet<String>, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::Corrupt {
        table,
        message: format!("bad category list '{json}': {e}"),
    })
}

/// Columns of a `visits` row before decoding.
struct VisitRow {
    id: String,
    title: String,
    place: String,
    categories: String,
    guide: Option<String>,
    date: String,
    start: Option<String>,
    duration_minutes: u32,
    capacity: u32,
    min_participants: u32,
    reserved_seats: u32,
    state: String,
    ticket_required: bool,
    accessible: bool,
}

impl VisitRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            place: row.get(2)?,
            categories: row.get(3)?,
            guide: row.get(4)?,
            date: row.get(5)?,
            start: row.get(6)?,
            duration_minutes: row.get(7)?,
            capacity: row.get(8)?,
            min_participants: row.get(9)?,
            reserved_seats: row.get(10)?,
            state: row.get(11)?,
            ticket_required: row.get(12)?,
            accessible: row.get(13)?,
        })
    }

    fn decode(self) -> Result<Visit, StoreError> {
        Ok(Visit {
            categories: decode_set("visits", &self.categories)?,
            date: parse_date("visits", &self.date)?,
            start: self.start.as_deref().map(parse_time).transpose()?,
            state: parse_state(&self.state)?,
            id: self.id,
            title: self.title,
            place: self.place,
            guide: self.guide,
            duration_minutes: self.duration_minutes,
            capacity: self.capacity,
            min_participants: self.min_participants,
            reserved_seats: self.reserved_seats,
            ticket_required: self.ticket_required,
            accessible: self.accessible,
        })
    }
}

/// SQLite database for the engine's persisted state.
pub struct TourDb {
    conn: Mutex<Connection>,
}

impl TourDb {
    /// Open the database at `~/.config/guidetour/guidetour.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("guidetour.db");
        Ok(Self::open_at(path)?)
    }

    /// Open (creating if needed) the database at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.lock().execute_batch(
            "CREATE TABLE IF NOT EXISTS visits (
                id               TEXT PRIMARY KEY,
                title            TEXT NOT NULL,
                place            TEXT NOT NULL,
                categories       TEXT NOT NULL DEFAULT '[]',
                guide            TEXT,
                date             TEXT NOT NULL,
                start_time       TEXT,
                duration_minutes INTEGER NOT NULL,
                capacity         INTEGER NOT NULL,
                min_participants INTEGER NOT NULL,
                reserved_seats   INTEGER NOT NULL DEFAULT 0,
                state            TEXT NOT NULL,
                ticket_required  INTEGER NOT NULL DEFAULT 0,
                accessible       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS blackout_dates (
                date   TEXT PRIMARY KEY,
                reason TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS availability (
                guide TEXT NOT NULL,
                date  TEXT,
                UNIQUE (guide, date)
            );

            CREATE TABLE IF NOT EXISTS places (
                name        TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                location    TEXT NOT NULL DEFAULT '',
                categories  TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS guides (
                email      TEXT PRIMARY KEY,
                name       TEXT NOT NULL,
                categories TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS categories (
                name        TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                weekdays    TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_visits_date ON visits(date);
            CREATE INDEX IF NOT EXISTS idx_visits_guide_date ON visits(guide, date);",
        )?;
        Ok(())
    }
}

impl Store for TourDb {
    fn load_visits(&self) -> Result<Vec<Visit>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, place, categories, guide, date, start_time, duration_minutes,
                    capacity, min_participants, reserved_seats, state, ticket_required, accessible
             FROM visits ORDER BY date, start_time, id",
        )?;
        let rows = stmt.query_map([], VisitRow::from_row)?;

        let mut visits = Vec::new();
        for row in rows {
            match row.map_err(StoreError::from).and_then(VisitRow::decode) {
                Ok(visit) => visits.push(visit),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable visit row"),
            }
        }
        Ok(visits)
    }

    fn save_visit(&self, visit: &Visit) -> Result<(), StoreError> {
        let categories = encode_set(&visit.categories)?;
        self.lock().execute(
            "INSERT OR REPLACE INTO visits (id, title, place, categories, guide, date, start_time,
                duration_minutes, capacity, min_participants, reserved_seats, state,
                ticket_required, accessible)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                visit.id,
                visit.title,
                visit.place,
                categories,
                visit.guide,
                format_date(visit.date),
                visit.start.map(|t| t.format(TIME_FORMAT).to_string()),
                visit.duration_minutes,
                visit.capacity,
                visit.min_participants,
                visit.reserved_seats,
                visit.state.as_str(),
                visit.ticket_required,
                visit.accessible,
            ],
        )?;
        Ok(())
    }

    fn load_blackout_dates(&self) -> Result<BTreeMap<NaiveDate, String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT date, reason FROM blackout_dates")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut dates = BTreeMap::new();
        for row in rows {
            let (date, reason) = row?;
            match parse_date("blackout_dates", &date) {
                Ok(date) => {
                    dates.insert(date, reason);
                }
                Err(e) => tracing::warn!(error = %e, "skipping unreadable blackout date"),
            }
        }
        Ok(dates)
    }

    fn add_blackout_date(&self, date: NaiveDate, reason: &str) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT OR IGNORE INTO blackout_dates (date, reason) VALUES (?1, ?2)",
            params![format_date(date), reason],
        )?;
        Ok(())
    }

    fn remove_blackout_date(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.lock().execute(
            "DELETE FROM blackout_dates WHERE date = ?1",
            params![format_date(date)],
        )?;
        Ok(())
    }

    fn load_availability(&self, guide: &str) -> Result<Option<Vec<NaiveDate>>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT date FROM availability WHERE guide = ?1 ORDER BY date")?;
        let rows = stmt.query_map(params![guide], |row| row.get::<_, Option<String>>(0))?;

        let mut found = false;
        let mut dates = Vec::new();
        for row in rows {
            found = true;
            // A NULL date marks an explicit empty record.
            if let Some(date) = row? {
                match parse_date("availability", &date) {
                    Ok(date) => dates.push(date),
                    Err(e) => tracing::warn!(guide, error = %e, "skipping unreadable availability date"),
                }
            }
        }
        Ok(found.then_some(dates))
    }

    fn replace_availability(&self, snapshot: &AvailabilitySnapshot) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM availability", [])?;
        {
            let mut insert =
                tx.prepare("INSERT OR IGNORE INTO availability (guide, date) VALUES (?1, ?2)")?;
            for (guide, dates) in snapshot {
                if dates.is_empty() {
                    insert.execute(params![guide, Option::<String>::None])?;
                }
                for date in dates {
                    insert.execute(params![guide, format_date(*date)])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn set_availability_open(&self, open: bool) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![AVAILABILITY_OPEN_KEY, open.to_string()],
        )?;
        Ok(())
    }

    fn availability_open(&self) -> Result<Option<bool>, StoreError> {
        let value: Option<String> = self
            .lock()
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![AVAILABILITY_OPEN_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.map(|v| v == "true"))
    }

    fn load_places(&self) -> Result<Vec<Place>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT name, description, location, categories FROM places ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut places = Vec::new();
        for row in rows {
            let (name, description, location, categories) = row?;
            match decode_set("places", &categories) {
                Ok(categories) => places.push(Place {
                    name,
                    description,
                    location,
                    categories,
                }),
                Err(e) => tracing::warn!(place = %name, error = %e, "skipping unreadable place"),
            }
        }
        Ok(places)
    }

    fn save_place(&self, place: &Place) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT OR REPLACE INTO places (name, description, location, categories)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                place.name,
                place.description,
                place.location,
                encode_set(&place.categories)?
            ],
        )?;
        Ok(())
    }

    fn load_guides(&self) -> Result<Vec<Guide>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT email, name, categories FROM guides ORDER BY email")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut guides = Vec::new();
        for row in rows {
            let (email, name, categories) = row?;
            match decode_set("guides", &categories) {
                Ok(categories) => guides.push(Guide {
                    email,
                    name,
                    categories,
                }),
                Err(e) => tracing::warn!(guide = %email, error = %e, "skipping unreadable guide"),
            }
        }
        Ok(guides)
    }

    fn save_guide(&self, guide: &Guide) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT OR REPLACE INTO guides (email, name, categories) VALUES (?1, ?2, ?3)",
            params![guide.email, guide.name, encode_set(&guide.categories)?],
        )?;
        Ok(())
    }

    fn load_categories(&self) -> Result<Vec<VisitCategory>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT name, description, weekdays FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut categories = Vec::new();
        for row in rows {
            let (name, description, weekdays) = row?;
            match serde_json::from_str(&weekdays) {
                Ok(weekdays) => categories.push(VisitCategory {
                    name,
                    description,
                    weekdays,
                    built_in: false,
                }),
                Err(e) => {
                    tracing::warn!(category = %name, error = %e, "skipping unreadable category")
                }
            }
        }
        Ok(categories)
    }

    fn save_category(&self, category: &VisitCategory) -> Result<(), StoreError> {
        let weekdays = serde_json::to_string(&category.weekdays)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        self.lock().execute(
            "INSERT OR REPLACE INTO categories (name, description, weekdays) VALUES (?1, ?2, ?3)",
            params![category.name, category.description, weekdays],
        )?;
        Ok(())
    }

    fn remove_category(&self, name: &str) -> Result<(), StoreError> {
        self.lock()
            .execute("DELETE FROM categories WHERE name = ?1", params![name])?;
        Ok(())
    }
}
