//! Store backed by in-process maps.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{AvailabilitySnapshot, Store};
use crate::catalog::{read, write, Guide, Place, VisitCategory};
use crate::error::StoreError;
use crate::visit::Visit;

#[derive(Debug, Default)]
pub struct MemoryStore {
    visits: RwLock<HashMap<String, Visit>>,
    blackouts: RwLock<BTreeMap<NaiveDate, String>>,
    availability: RwLock<AvailabilitySnapshot>,
    availability_open: RwLock<Option<bool>>,
    places: RwLock<BTreeMap<String, Place>>,
    guides: RwLock<BTreeMap<String, Guide>>,
    categories: RwLock<BTreeMap<String, VisitCategory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of guides with a persisted availability record.
    pub fn availability_records(&self) -> usize {
        read(&self.availability).len()
    }
}

impl Store for MemoryStore {
    fn load_visits(&self) -> Result<Vec<Visit>, StoreError> {
        Ok(read(&self.visits).values().cloned().collect())
    }

    fn save_visit(&self, visit: &Visit) -> Result<(), StoreError> {
        write(&self.visits).insert(visit.id.clone(), visit.clone());
        Ok(())
    }

    fn load_blackout_dates(&self) -> Result<BTreeMap<NaiveDate, String>, StoreError> {
        Ok(read(&self.blackouts).clone())
    }

    fn add_blackout_date(&self, date: NaiveDate, reason: &str) -> Result<(), StoreError> {
        write(&self.blackouts)
            .entry(date)
            .or_insert_with(|| reason.to_string());
        Ok(())
    }

    fn remove_blackout_date(&self, date: NaiveDate) -> Result<(), StoreError> {
        write(&self.blackouts).remove(&date);
        Ok(())
    }

    fn load_availability(&self, guide: &str) -> Result<Option<Vec<NaiveDate>>, StoreError> {
        Ok(read(&self.availability).get(guide).cloned())
    }

    fn replace_availability(&self, snapshot: &AvailabilitySnapshot) -> Result<(), StoreError> {
        *write(&self.availability) = snapshot.clone();
        Ok(())
    }

    fn set_availability_open(&self, open: bool) -> Result<(), StoreError> {
        *write(&self.availability_open) = Some(open);
        Ok(())
    }

    fn availability_open(&self) -> Result<Option<bool>, StoreError> {
        Ok(*read(&self.availability_open))
    }

    fn load_places(&self) -> Result<Vec<Place>, StoreError> {
        Ok(read(&self.places).values().cloned().collect())
    }

    fn save_place(&self, place: &Place) -> Result<(), StoreError> {
        write(&self.places).insert(place.name.clone(), place.clone());
        Ok(())
    }

    fn load_guides(&self) -> Result<Vec<Guide>, StoreError> {
        Ok(read(&self.guides).values().cloned().collect())
    }

    fn save_guide(&self, guide: &Guide) -> Result<(), StoreError> {
        write(&self.guides).insert(guide.email.clone(), guide.clone());
        Ok(())
    }

    fn load_categories(&self) -> Result<Vec<VisitCategory>, StoreError> {
        Ok(read(&self.categories).values().cloned().collect())
    }

    fn save_category(&self, category: &VisitCategory) -> Result<(), StoreError> {
        write(&self.categories).insert(category.name.clone(), category.clone());
        Ok(())
    }

    fn remove_category(&self, name: &str) -> Result<(), StoreError> {
        write(&self.categories).remove(name);
        Ok(())
    }
}
