use serde::Deserialize;

use super::domain::{Counter, Property, PropertyFlag, PropertyId, PropertyStatus, PropertyType};
use crate::accounts::builders::BuilderId;
use crate::store::RepositoryError;

/// Search filter shared by the public, builder and admin listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyFilter {
    pub builder_id: Option<BuilderId>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub locality: Option<String>,
    pub status: Option<PropertyStatus>,
    pub bhk: Option<String>,
    pub flag: Option<PropertyFlag>,
    pub admin_approved: Option<bool>,
    /// Bounds in rupees.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Free text matched against name, locality and city.
    pub q: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        let equals_ignore_case =
            |value: &str, expected: &Option<String>| expected.as_ref().map_or(true, |expected| {
                value.eq_ignore_ascii_case(expected.trim())
            });
        let price = property.price.in_rupees();
        let text_matches = self.q.as_ref().map_or(true, |query| {
            let query = query.trim().to_lowercase();
            [&property.name, &property.locality, &property.city]
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
        });
        let bhk_matches = self.bhk.as_ref().map_or(true, |bhk| {
            property
                .bhk
                .as_ref()
                .is_some_and(|value| value.eq_ignore_ascii_case(&bhk.replace(' ', "")))
        });

        self.builder_id
            .as_ref()
            .map_or(true, |builder| &property.builder_id == builder)
            && self
                .property_type
                .map_or(true, |kind| property.property_type == kind)
            && equals_ignore_case(&property.city, &self.city)
            && equals_ignore_case(&property.locality, &self.locality)
            && self.status.map_or(true, |status| property.status == status)
            && bhk_matches
            && self.flag.map_or(true, |flag| property.flags.contains(&flag))
            && self
                .admin_approved
                .map_or(true, |approved| property.admin_approved == approved)
            && self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
            && text_matches
    }
}

/// Storage abstraction for the property catalog. Slugs are unique.
pub trait PropertyRepository: Send + Sync {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    /// Replace a listing, keeping the stored counters.
    fn update(&self, property: Property) -> Result<Property, RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Property>, RepositoryError>;
    fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, RepositoryError>;
    fn delete(&self, id: &PropertyId) -> Result<bool, RepositoryError>;
    /// Atomically apply a signed delta to a counter, never going below zero.
    fn adjust_counter(
        &self,
        id: &PropertyId,
        counter: Counter,
        delta: i64,
    ) -> Result<Property, RepositoryError>;
}
