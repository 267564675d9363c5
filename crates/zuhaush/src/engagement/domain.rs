use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::users::UserId;
use crate::catalog::PropertyId;
use crate::store::record_id;

record_id!(LikeId);
record_id!(CommentId);
record_id!(PropertyViewId);

/// Longest comment body accepted.
pub const COMMENT_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeStatus {
    #[default]
    Active,
    Inactive,
    Flagged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub status: LikeStatus,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(user_id: UserId, property_id: PropertyId) -> Self {
        Self {
            id: LikeId::generate(),
            user_id,
            property_id,
            status: LikeStatus::Active,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    #[default]
    Active,
    Inactive,
    Flagged,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub text: String,
    pub status: CommentStatus,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_visible(&self) -> bool {
        self.status == CommentStatus::Active
    }

    pub fn edit(&mut self, text: String) {
        let now = Utc::now();
        self.text = text;
        self.is_edited = true;
        self.edited_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyView {
    pub id: PropertyViewId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub viewed_at: DateTime<Utc>,
}
