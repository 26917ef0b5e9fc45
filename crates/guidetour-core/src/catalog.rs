//! Places, guides and visit categories.
//!
//! [`Catalog`] is the entity manager the engine validates against: it
//! hands out canonical copies keyed by place name, guide email and
//! category name.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::calendar::is_weekend;
use crate::error::ValidationError;

const WORKING_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Theme of a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitCategory {
    pub name: String,
    pub description: String,
    /// Weekdays visits of this category may run on
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub built_in: bool,
}

fn default_weekdays() -> Vec<Weekday> {
    WORKING_DAYS.to_vec()
}

impl VisitCategory {
    /// A custom category schedulable Monday to Friday.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            weekdays: default_weekdays(),
            built_in: false,
        }
    }

    pub fn with_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    /// Weekends are excluded whatever `weekdays` says.
    pub fn schedulable_on(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && self.weekdays.contains(&date.weekday())
    }

    /// The categories every installation starts with.
    pub fn built_ins() -> Vec<VisitCategory> {
        [
            ("historical", "History of the site and its people"),
            ("scientific", "Science and technology collections"),
            ("artistic", "Art, architecture and craft"),
            ("naturalistic", "Gardens, parks and natural heritage"),
        ]
        .into_iter()
        .map(|(name, description)| VisitCategory {
            built_in: true,
            ..VisitCategory::new(name, description)
        })
        .collect()
    }
}

/// A site offering one or more visit categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub description: String,
    pub location: String,
    pub categories: BTreeSet<String>,
}

impl Place {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            location: location.into(),
            categories: BTreeSet::new(),
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

    pub fn offers(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

/// A volunteer guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    pub email: String,
    pub name: String,
    /// Category names the guide may lead
    pub categories: BTreeSet<String>,
}

impl Guide {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            categories: BTreeSet::new(),
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

    pub fn is_qualified_for(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

/// Concurrent lookup tables for places, guides and categories.
#[derive(Debug)]
pub struct Catalog {
    places: RwLock<HashMap<String, Place>>,
    guides: RwLock<HashMap<String, Guide>>,
    categories: RwLock<HashMap<String, VisitCategory>>,
}

impl Catalog {
    /// Empty catalog seeded with the built-in categories.
    pub fn new() -> Self {
        let categories = VisitCategory::built_ins()
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        Self {
            places: RwLock::new(HashMap::new()),
            guides: RwLock::new(HashMap::new()),
            categories: RwLock::new(categories),
        }
    }

    pub fn place(&self, name: &str) -> Option<Place> {
        read(&self.places).get(name).cloned()
    }

    pub fn guide(&self, email: &str) -> Option<Guide> {
        read(&self.guides).get(email).cloned()
    }

    pub fn category(&self, name: &str) -> Option<VisitCategory> {
        read(&self.categories).get(name).cloned()
    }

    /// Places sorted by name.
    pub fn places(&self) -> Vec<Place> {
        let mut places: Vec<_> = read(&self.places).values().cloned().collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        places
    }

    /// Guides sorted by email.
    pub fn guides(&self) -> Vec<Guide> {
        let mut guides: Vec<_> = read(&self.guides).values().cloned().collect();
        guides.sort_by(|a, b| a.email.cmp(&b.email));
        guides
    }

    /// Categories sorted by name.
    pub fn categories(&self) -> Vec<VisitCategory> {
        let mut categories: Vec<_> = read(&self.categories).values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    /// First place, by name, offering `category`.
    pub fn place_offering(&self, category: &str) -> Option<Place> {
        self.places().into_iter().find(|p| p.offers(category))
    }

    /// Insert or replace a place.
    pub fn put_place(&self, place: Place) {
        write(&self.places).insert(place.name.clone(), place);
    }

    /// Insert or replace a guide.
    pub fn put_guide(&self, guide: Guide) {
        write(&self.guides).insert(guide.email.clone(), guide);
    }

    /// Insert or replace a category. A built-in keeps its built-in flag.
    pub fn put_category(&self, mut category: VisitCategory) {
        let mut categories = write(&self.categories);
        if categories.get(&category.name).is_some_and(|c| c.built_in) {
            category.built_in = true;
        }
        categories.insert(category.name.clone(), category);
    }

    /// Remove a custom category. Returns whether it existed.
    pub fn remove_category(&self, name: &str) -> Result<bool, ValidationError> {
        let mut categories = write(&self.categories);
        match categories.get(name) {
            Some(c) if c.built_in => Err(ValidationError::BuiltInCategory(name.to_string())),
            Some(_) => Ok(categories.remove(name).is_some()),
            None => Ok(false),
        }
    }

    /// Bulk reload of places, guides and custom categories.
    pub fn replace_all(
        &self,
        places: Vec<Place>,
        guides: Vec<Guide>,
        categories: Vec<VisitCategory>,
    ) {
        *write(&self.places) = places.into_iter().map(|p| (p.name.clone(), p)).collect();
        *write(&self.guides) = guides.into_iter().map(|g| (g.email.clone(), g)).collect();
        let mut table = write(&self.categories);
        table.retain(|_, c| c.built_in);
        drop(table);
        for category in categories {
            self.put_category(category);
        }
    }

    /// Look up category names. Unknown names are logged and skipped.
    pub fn resolve_categories<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> Vec<VisitCategory> {
        let table = read(&self.categories);
        names
            .into_iter()
            .filter_map(|name| {
                let found = table.get(name).cloned();
                if found.is_none() {
                    tracing::warn!(category = %name, "skipping unknown visit category");
                }
                found
            })
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins_are_seeded_and_protected() {
        let catalog = Catalog::new();
        assert!(catalog.category("historical").is_some());
        assert_eq!(
            catalog.remove_category("historical"),
            Err(ValidationError::BuiltInCategory("historical".into()))
        );
        assert!(catalog.category("historical").is_some());
    }

    #[test]
    fn custom_categories_can_be_removed() {
        let catalog = Catalog::new();
        catalog.put_category(VisitCategory::new("night", "Evening tours"));
        assert_eq!(catalog.remove_category("night"), Ok(true));
        assert_eq!(catalog.remove_category("night"), Ok(false));
    }

    #[test]
    fn overwriting_a_built_in_keeps_it_protected() {
        let catalog = Catalog::new();
        catalog.put_category(VisitCategory::new("scientific", "Updated text"));
        let category = catalog.category("scientific").unwrap();
        assert!(category.built_in);
        assert_eq!(category.description, "Updated text");
    }

    #[test]
    fn categories_never_run_on_weekends() {
        let all_week = VisitCategory::new("any", "").with_weekdays([
            Weekday::Mon,
            Weekday::Sat,
            Weekday::Sun,
        ]);
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert!(!all_week.schedulable_on(saturday));
        assert!(all_week.schedulable_on(monday));
        assert!(!all_week.schedulable_on(tuesday));
    }

    #[test]
    fn place_offering_picks_first_by_name() {
        let catalog = Catalog::new();
        catalog.put_place(Place::new("Zoo", "", "north").with_categories(["naturalistic"]));
        catalog.put_place(Place::new("Arboretum", "", "east").with_categories(["naturalistic"]));
        assert_eq!(catalog.place_offering("naturalistic").unwrap().name, "Arboretum");
        assert!(catalog.place_offering("artistic").is_none());
    }

    #[test]
    fn resolve_skips_unknown_names() {
        let catalog = Catalog::new();
        let names = vec!["historical".to_string(), "astrology".to_string()];
        let resolved = catalog.resolve_categories(&names);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "historical");
    }

    #[test]
    fn replace_all_keeps_built_ins() {
        let catalog = Catalog::new();
        catalog.put_category(VisitCategory::new("old", ""));
        catalog.replace_all(
            vec![Place::new("Museum", "", "centre")],
            vec![Guide::new("anna@example.org", "Anna")],
            vec![VisitCategory::new("new", "")],
        );
        assert!(catalog.category("old").is_none());
        assert!(catalog.category("new").is_some());
        assert!(catalog.category("artistic").is_some());
        assert_eq!(catalog.places().len(), 1);
        assert!(catalog.guide("anna@example.org").is_some());
    }
}
