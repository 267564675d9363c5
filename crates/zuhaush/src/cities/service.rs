use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::domain::{City, CityId, DEFAULT_COUNTRY};
use super::repository::CityRepository;
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::{optional_text, required_text};

const CITY_SORT_FIELDS: &[&str] = &["name", "state", "created_at"];

const NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCity {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityUpdate {
    pub name: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_active: Option<bool>,
}

fn city_not_found() -> ServiceError {
    ServiceError::not_found("City not found")
}

fn name_taken(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::conflict("City name already taken"),
        other => other.into(),
    }
}

fn by_name(cities: &mut [City], page: Option<&PageRequest>) -> Result<(), ServiceError> {
    match page.and_then(|page| page.sort.as_ref()) {
        Some(sort) => sort.apply(cities, CITY_SORT_FIELDS, |field, a: &City, b: &City| match field {
            "name" => Some(a.name.to_lowercase().cmp(&b.name.to_lowercase())),
            "state" => Some(a.state.cmp(&b.state)),
            "created_at" => Some(a.created_at.cmp(&b.created_at)),
            _ => None,
        }),
        None => {
            cities.sort_by_key(|city| city.name.to_lowercase());
            Ok(())
        }
    }
}

/// Directory of cities offered in search and registration forms.
pub struct CityService {
    cities: Arc<dyn CityRepository>,
}

impl CityService {
    pub fn new(cities: Arc<dyn CityRepository>) -> Self {
        Self { cities }
    }

    pub fn create(&self, input: NewCity) -> Result<City, ServiceError> {
        let now = Utc::now();
        let city = City {
            id: CityId::generate(),
            name: required_text("City name", &input.name, NAME_MAX_CHARS)?,
            state: required_text("State", &input.state, NAME_MAX_CHARS)?,
            country: optional_text("Country", input.country.as_deref(), NAME_MAX_CHARS)?
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let city = self.cities.insert(city).map_err(name_taken)?;
        info!(city = %city.id, name = %city.name, "city added");
        Ok(city)
    }

    pub fn get(&self, id: &CityId) -> Result<City, ServiceError> {
        self.cities.fetch(id)?.ok_or_else(city_not_found)
    }

    /// Active cities in alphabetical order.
    pub fn active(&self) -> Result<Vec<City>, ServiceError> {
        let mut cities: Vec<City> = self
            .cities
            .list()?
            .into_iter()
            .filter(|city| city.is_active)
            .collect();
        by_name(&mut cities, None)?;
        Ok(cities)
    }

    /// Case-insensitive substring match over active city names.
    pub fn search(&self, query: &str, page: &PageRequest) -> Result<Page<City>, ServiceError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ServiceError::validation("Search term is required"));
        }
        let mut cities: Vec<City> = self
            .cities
            .list()?
            .into_iter()
            .filter(|city| city.is_active && city.name.to_lowercase().contains(&needle))
            .collect();
        by_name(&mut cities, Some(page))?;
        Ok(Page::paginate(cities, page))
    }

    pub fn update(&self, id: &CityId, update: CityUpdate) -> Result<City, ServiceError> {
        let mut city = self.get(id)?;
        if let Some(name) = update.name.as_deref() {
            city.name = required_text("City name", name, NAME_MAX_CHARS)?;
        }
        if let Some(state) = update.state.as_deref() {
            city.state = required_text("State", state, NAME_MAX_CHARS)?;
        }
        if let Some(country) = update.country.as_deref() {
            city.country = required_text("Country", country, NAME_MAX_CHARS)?;
        }
        if let Some(active) = update.is_active {
            city.is_active = active;
        }
        city.updated_at = Utc::now();
        self.cities.update(city).map_err(name_taken)
    }

    pub fn delete(&self, id: &CityId) -> Result<(), ServiceError> {
        if !self.cities.delete(id)? {
            return Err(city_not_found());
        }
        info!(city = %id, "city removed");
        Ok(())
    }
}
