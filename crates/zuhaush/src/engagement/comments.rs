use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::domain::{Comment, CommentId, CommentStatus, COMMENT_MAX_CHARS};
use super::likes::{existing_property, newest_first};
use super::repository::{CommentFilter, CommentRepository};
use crate::accounts::builders::BuilderId;
use crate::accounts::users::UserId;
use crate::catalog::{PropertyFilter, PropertyId, PropertyRepository};
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::validation::required_text;

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentModeration {
    pub status: CommentStatus,
}

fn comment_not_found() -> ServiceError {
    ServiceError::not_found("Comment not found")
}

fn comment_text(raw: &str) -> Result<String, ServiceError> {
    required_text("Comment", raw, COMMENT_MAX_CHARS)
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        properties: Arc<dyn PropertyRepository>,
    ) -> Self {
        Self {
            comments,
            properties,
        }
    }

    /// A comment that has not been deleted.
    fn live(&self, id: &CommentId) -> Result<Comment, ServiceError> {
        self.comments
            .fetch(id)?
            .filter(|comment| comment.status != CommentStatus::Deleted)
            .ok_or_else(comment_not_found)
    }

    fn owned(&self, user: &UserId, id: &CommentId, action: &str) -> Result<Comment, ServiceError> {
        let comment = self.live(id)?;
        if &comment.user_id != user {
            return Err(ServiceError::forbidden(format!(
                "You can only {action} your own comments"
            )));
        }
        Ok(comment)
    }

    pub fn create(
        &self,
        user: &UserId,
        property: &PropertyId,
        input: CommentInput,
    ) -> Result<Comment, ServiceError> {
        existing_property(self.properties.as_ref(), property)?;
        let text = comment_text(&input.text)?;
        let now = Utc::now();
        let comment = self.comments.insert(Comment {
            id: CommentId::generate(),
            user_id: user.clone(),
            property_id: property.clone(),
            text,
            status: CommentStatus::Active,
            is_edited: false,
            edited_at: None,
            created_at: now,
            updated_at: now,
        })?;
        info!(comment = %comment.id, property = %property, "comment posted");
        Ok(comment)
    }

    pub fn for_property(
        &self,
        property: &PropertyId,
        page: &PageRequest,
    ) -> Result<Page<Comment>, ServiceError> {
        existing_property(self.properties.as_ref(), property)?;
        let mut comments = self.comments.list(&CommentFilter {
            property_id: Some(property.clone()),
            status: Some(CommentStatus::Active),
            ..CommentFilter::default()
        })?;
        newest_first(&mut comments, page, |comment| comment.created_at)?;
        Ok(Page::paginate(comments, page))
    }

    pub fn for_user(&self, user: &UserId, page: &PageRequest) -> Result<Page<Comment>, ServiceError> {
        let mut comments: Vec<Comment> = self
            .comments
            .list(&CommentFilter {
                user_id: Some(user.clone()),
                ..CommentFilter::default()
            })?
            .into_iter()
            .filter(|comment| comment.status != CommentStatus::Deleted)
            .collect();
        newest_first(&mut comments, page, |comment| comment.created_at)?;
        Ok(Page::paginate(comments, page))
    }

    pub fn get(&self, id: &CommentId) -> Result<Comment, ServiceError> {
        self.comments
            .fetch(id)?
            .filter(Comment::is_visible)
            .ok_or_else(comment_not_found)
    }

    pub fn update(
        &self,
        user: &UserId,
        id: &CommentId,
        input: CommentInput,
    ) -> Result<Comment, ServiceError> {
        let mut comment = self.owned(user, id, "edit")?;
        comment.edit(comment_text(&input.text)?);
        Ok(self.comments.update(comment)?)
    }

    /// Soft delete; the record stays with status `deleted`.
    pub fn delete(&self, user: &UserId, id: &CommentId) -> Result<(), ServiceError> {
        let mut comment = self.owned(user, id, "delete")?;
        comment.status = CommentStatus::Deleted;
        comment.updated_at = Utc::now();
        self.comments.update(comment)?;
        info!(comment = %id, "comment deleted");
        Ok(())
    }

    /// Active comments left on any of the builder's listings.
    pub fn builder_inbox(
        &self,
        builder: &BuilderId,
        page: &PageRequest,
    ) -> Result<Page<Comment>, ServiceError> {
        let owned: HashSet<PropertyId> = self
            .properties
            .list(&PropertyFilter {
                builder_id: Some(builder.clone()),
                ..PropertyFilter::default()
            })?
            .into_iter()
            .map(|property| property.id)
            .collect();

        let mut comments: Vec<Comment> = self
            .comments
            .list(&CommentFilter {
                status: Some(CommentStatus::Active),
                ..CommentFilter::default()
            })?
            .into_iter()
            .filter(|comment| owned.contains(&comment.property_id))
            .collect();
        newest_first(&mut comments, page, |comment| comment.created_at)?;
        Ok(Page::paginate(comments, page))
    }

    /// Admin moderation: hide, flag or restore a comment.
    pub fn moderate(&self, id: &CommentId, status: CommentStatus) -> Result<Comment, ServiceError> {
        let mut comment = self.comments.fetch(id)?.ok_or_else(comment_not_found)?;
        comment.status = status;
        comment.updated_at = Utc::now();
        let comment = self.comments.update(comment)?;
        info!(comment = %id, ?status, "comment moderated");
        Ok(comment)
    }

    pub fn list(
        &self,
        filter: &CommentFilter,
        page: &PageRequest,
    ) -> Result<Page<Comment>, ServiceError> {
        let mut comments = self.comments.list(filter)?;
        newest_first(&mut comments, page, |comment| comment.created_at)?;
        Ok(Page::paginate(comments, page))
    }
}
