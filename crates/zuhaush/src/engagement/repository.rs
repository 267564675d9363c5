use serde::Deserialize;

use super::domain::{Comment, CommentId, CommentStatus, Like, LikeId, PropertyView};
use crate::accounts::users::UserId;
use crate::catalog::PropertyId;
use crate::store::RepositoryError;

/// Storage for likes. At most one like exists per (user, property); `insert` answers
/// `RepositoryError::Conflict` for a second one.
pub trait LikeRepository: Send + Sync {
    fn insert(&self, like: Like) -> Result<Like, RepositoryError>;
    fn find(&self, user: &UserId, property: &PropertyId) -> Result<Option<Like>, RepositoryError>;
    fn delete(&self, id: &LikeId) -> Result<bool, RepositoryError>;
    fn for_property(&self, property: &PropertyId) -> Result<Vec<Like>, RepositoryError>;
    fn for_user(&self, user: &UserId) -> Result<Vec<Like>, RepositoryError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFilter {
    pub user_id: Option<UserId>,
    pub property_id: Option<PropertyId>,
    pub status: Option<CommentStatus>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.user_id.as_ref().map_or(true, |user| &comment.user_id == user)
            && self
                .property_id
                .as_ref()
                .map_or(true, |property| &comment.property_id == property)
            && self.status.map_or(true, |status| comment.status == status)
    }
}

pub trait CommentRepository: Send + Sync {
    fn insert(&self, comment: Comment) -> Result<Comment, RepositoryError>;
    fn update(&self, comment: Comment) -> Result<Comment, RepositoryError>;
    fn fetch(&self, id: &CommentId) -> Result<Option<Comment>, RepositoryError>;
    fn list(&self, filter: &CommentFilter) -> Result<Vec<Comment>, RepositoryError>;
}

pub trait PropertyViewRepository: Send + Sync {
    fn insert(&self, view: PropertyView) -> Result<PropertyView, RepositoryError>;
    fn for_user(&self, user: &UserId) -> Result<Vec<PropertyView>, RepositoryError>;
}
