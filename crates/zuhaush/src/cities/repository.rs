use super::domain::{City, CityId};
use crate::store::RepositoryError;

/// City directory storage. Names are unique ignoring case; `insert` and `update` answer
/// `RepositoryError::Conflict` for a taken name.
pub trait CityRepository: Send + Sync {
    fn insert(&self, city: City) -> Result<City, RepositoryError>;
    fn update(&self, city: City) -> Result<City, RepositoryError>;
    fn fetch(&self, id: &CityId) -> Result<Option<City>, RepositoryError>;
    fn list(&self) -> Result<Vec<City>, RepositoryError>;
    fn delete(&self, id: &CityId) -> Result<bool, RepositoryError>;
}
