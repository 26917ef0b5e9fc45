//! Engine construction shared by the commands.

use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

use guidetour_core::{Clock, Config, FixedClock, SystemClock, TourDb, TourEngine};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub struct Context {
    pub config: Config,
    /// `--today` override
    pub today: Option<NaiveDate>,
}

impl Context {
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.today {
            Some(day) => Arc::new(FixedClock::new(day)),
            None => Arc::new(SystemClock),
        }
    }

    /// Open the database and load every collection.
    pub fn engine(&self) -> Result<TourEngine, Box<dyn std::error::Error>> {
        let db = match &self.config.storage.database_path {
            Some(path) => TourDb::open_at(path)?,
            None => TourDb::open()?,
        };
        let engine = TourEngine::new(Arc::new(db), self.clock(), &self.config);
        engine.load()?;
        Ok(engine)
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{raw}', expected HH:MM"))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
