use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::domain::{Like, LikeStatus};
use super::repository::LikeRepository;
use crate::accounts::users::UserId;
use crate::catalog::{Counter, Property, PropertyId, PropertyRepository};
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub message: String,
    pub like_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

pub(super) fn property_not_found() -> ServiceError {
    ServiceError::not_found("Property not found")
}

pub(super) fn existing_property(
    properties: &dyn PropertyRepository,
    id: &PropertyId,
) -> Result<Property, ServiceError> {
    properties.fetch(id)?.ok_or_else(property_not_found)
}

pub(super) fn newest_first<T, F>(
    items: &mut [T],
    page: &PageRequest,
    created_at: F,
) -> Result<(), ServiceError>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    match &page.sort {
        Some(sort) => sort.apply(items, &["created_at"], |field, a: &T, b: &T| match field {
            "created_at" => Some(created_at(a).cmp(&created_at(b))),
            _ => None,
        }),
        None => {
            items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
            Ok(())
        }
    }
}

/// Likes on listings. The property like counter follows every toggle and never drops below zero.
pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikeRepository>, properties: Arc<dyn PropertyRepository>) -> Self {
        Self { likes, properties }
    }

    fn adjust(&self, property: &PropertyId, delta: i64) -> Result<u64, ServiceError> {
        match self.properties.adjust_counter(property, Counter::Likes, delta) {
            Ok(property) => Ok(property.likes),
            Err(RepositoryError::NotFound) => Err(property_not_found()),
            Err(other) => Err(other.into()),
        }
    }

    pub fn toggle(&self, user: &UserId, property: &PropertyId) -> Result<LikeToggle, ServiceError> {
        let current = existing_property(self.properties.as_ref(), property)?;

        if let Some(like) = self.likes.find(user, property)? {
            if !self.likes.delete(&like.id)? {
                debug!(like = %like.id, "like already removed by a concurrent toggle");
                return Ok(LikeToggle {
                    liked: false,
                    message: "Property unliked".to_string(),
                    like_count: current.likes,
                });
            }
            let like_count = self.adjust(property, -1)?;
            return Ok(LikeToggle {
                liked: false,
                message: "Property unliked".to_string(),
                like_count,
            });
        }

        match self.likes.insert(Like::new(user.clone(), property.clone())) {
            Ok(_) => {}
            Err(RepositoryError::Conflict(_)) => {
                return Err(ServiceError::conflict("Property already liked"));
            }
            Err(other) => return Err(other.into()),
        }
        let like_count = self.adjust(property, 1)?;
        Ok(LikeToggle {
            liked: true,
            message: "Property liked".to_string(),
            like_count,
        })
    }

    pub fn status(&self, user: &UserId, property: &PropertyId) -> Result<LikeState, ServiceError> {
        let current = existing_property(self.properties.as_ref(), property)?;
        let liked = self
            .likes
            .find(user, property)?
            .is_some_and(|like| like.status == LikeStatus::Active);
        Ok(LikeState {
            liked,
            like_count: current.likes,
        })
    }

    pub fn for_property(
        &self,
        property: &PropertyId,
        page: &PageRequest,
    ) -> Result<Page<Like>, ServiceError> {
        existing_property(self.properties.as_ref(), property)?;
        let mut likes: Vec<Like> = self
            .likes
            .for_property(property)?
            .into_iter()
            .filter(|like| like.status == LikeStatus::Active)
            .collect();
        newest_first(&mut likes, page, |like| like.created_at)?;
        Ok(Page::paginate(likes, page))
    }

    /// Listings the user currently likes, most recent like first.
    pub fn liked_properties(
        &self,
        user: &UserId,
        page: &PageRequest,
    ) -> Result<Page<Property>, ServiceError> {
        let mut likes: Vec<Like> = self
            .likes
            .for_user(user)?
            .into_iter()
            .filter(|like| like.status == LikeStatus::Active)
            .collect();
        newest_first(&mut likes, page, |like| like.created_at)?;

        let mut properties = Vec::with_capacity(likes.len());
        for like in likes {
            if let Some(property) = self.properties.fetch(&like.property_id)? {
                properties.push(property);
            }
        }
        Ok(Page::paginate(properties, page))
    }
}
