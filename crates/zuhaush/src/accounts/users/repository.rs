use serde::Deserialize;

use super::domain::{RegistrationStatus, User, UserId, UserRole};
use crate::store::RepositoryError;

/// Admin-side listing filter; every field narrows the result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub registration_status: Option<RegistrationStatus>,
    pub is_active: Option<bool>,
    pub city: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        let contains = |haystack: Option<&str>, needle: &Option<String>| match needle {
            Some(needle) => haystack
                .is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase())),
            None => true,
        };

        contains(user.name.as_deref(), &self.name)
            && contains(user.city_of_interest.as_deref(), &self.city)
            && self.role.map_or(true, |role| user.role == role)
            && self
                .registration_status
                .map_or(true, |status| user.registration_status == status)
            && self.is_active.map_or(true, |active| user.is_active == active)
    }
}

/// Storage abstraction for user accounts. E-mail is unique.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn update(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;
    fn delete(&self, id: &UserId) -> Result<bool, RepositoryError>;
}
