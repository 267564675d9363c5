use serde::Deserialize;

use super::domain::{Builder, BuilderId};
use super::workflow::BuilderStatus;
use crate::store::RepositoryError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderFilter {
    pub name: Option<String>,
    pub city: Option<String>,
    pub status: Option<BuilderStatus>,
    pub is_active: Option<bool>,
}

impl BuilderFilter {
    pub fn matches(&self, builder: &Builder) -> bool {
        let name_matches = self.name.as_ref().map_or(true, |needle| {
            let needle = needle.to_lowercase();
            builder.name.to_lowercase().contains(&needle)
                || builder
                    .company
                    .as_ref()
                    .is_some_and(|company| company.to_lowercase().contains(&needle))
        });
        let city_matches = self.city.as_ref().map_or(true, |city| {
            builder
                .city
                .as_ref()
                .is_some_and(|value| value.eq_ignore_ascii_case(city))
        });

        name_matches
            && city_matches
            && self.status.map_or(true, |status| builder.status == status)
            && self.is_active.map_or(true, |active| builder.is_active == active)
    }
}

/// Storage abstraction for builders and their embedded team members. E-mail is unique.
pub trait BuilderRepository: Send + Sync {
    fn insert(&self, builder: Builder) -> Result<Builder, RepositoryError>;
    fn update(&self, builder: Builder) -> Result<Builder, RepositoryError>;
    fn fetch(&self, id: &BuilderId) -> Result<Option<Builder>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError>;
    /// Builder owning a team member with this e-mail.
    fn find_by_member_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError>;
    fn list(&self, filter: &BuilderFilter) -> Result<Vec<Builder>, RepositoryError>;
    fn delete(&self, id: &BuilderId) -> Result<bool, RepositoryError>;
}
