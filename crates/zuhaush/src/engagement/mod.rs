//! User engagement with listings: likes, comments and browsing history. The shortlist
//! lives on the user record and is served by the user service.

pub mod comments;
pub mod domain;
pub mod likes;
pub mod repository;
pub mod router;
pub mod views;

#[cfg(test)]
mod tests;

pub use comments::{CommentInput, CommentModeration, CommentService};
pub use domain::{
    Comment, CommentId, CommentStatus, Like, LikeId, LikeStatus, PropertyView, PropertyViewId,
};
pub use likes::{LikeService, LikeState, LikeToggle};
pub use repository::{CommentFilter, CommentRepository, LikeRepository, PropertyViewRepository};
pub use router::{comment_router, like_router, property_view_router};
pub use views::{MostViewed, PropertyViewService, TrackView, ViewStats};
