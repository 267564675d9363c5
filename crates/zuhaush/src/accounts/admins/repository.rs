use super::domain::{Admin, AdminId};
use crate::store::RepositoryError;

/// Storage abstraction for console administrators. E-mail is unique.
pub trait AdminRepository: Send + Sync {
    fn insert(&self, admin: Admin) -> Result<Admin, RepositoryError>;
    fn update(&self, admin: Admin) -> Result<Admin, RepositoryError>;
    fn fetch(&self, id: &AdminId) -> Result<Option<Admin>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Admin>, RepositoryError>;
    fn list(&self) -> Result<Vec<Admin>, RepositoryError>;
    fn delete(&self, id: &AdminId) -> Result<bool, RepositoryError>;
}
