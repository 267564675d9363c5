use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::comments::{CommentInput, CommentModeration, CommentService};
use super::domain::CommentId;
use super::likes::LikeService;
use super::repository::CommentFilter;
use super::views::{PropertyViewService, TrackView};
use crate::accounts::admins::AdminPermission;
use crate::accounts::builders::TeamPermission;
use crate::auth::{AdminPrincipal, BuilderPrincipal, UserPrincipal};
use crate::catalog::PropertyId;
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    pub(crate) limit: Option<usize>,
}

/// Like toggles and counts.
pub fn like_router(service: Arc<LikeService>) -> Router {
    Router::new()
        .route("/v1/properties/:property_id/like", post(toggle_like_handler))
        .route(
            "/v1/properties/:property_id/like/status",
            get(like_status_handler),
        )
        .route("/v1/properties/:property_id/likes", get(property_likes_handler))
        .route("/v1/likes/mine", get(my_likes_handler))
        .with_state(service)
}

pub(crate) async fn toggle_like_handler(
    State(service): State<Arc<LikeService>>,
    user: UserPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.toggle(&user.id, &PropertyId(property_id))?))
}

pub(crate) async fn like_status_handler(
    State(service): State<Arc<LikeService>>,
    user: UserPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.status(&user.id, &PropertyId(property_id))?))
}

pub(crate) async fn property_likes_handler(
    State(service): State<Arc<LikeService>>,
    Path(property_id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_property(&PropertyId(property_id), &page)?))
}

pub(crate) async fn my_likes_handler(
    State(service): State<Arc<LikeService>>,
    user: UserPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.liked_properties(&user.id, &page)?))
}

/// Property comments, the builder inbox and admin moderation.
pub fn comment_router(service: Arc<CommentService>) -> Router {
    Router::new()
        .route(
            "/v1/properties/:property_id/comments",
            get(property_comments_handler).post(create_comment_handler),
        )
        .route("/v1/comments", get(admin_comments_handler))
        .route("/v1/comments/mine", get(my_comments_handler))
        .route("/v1/comments/builder", get(builder_comments_handler))
        .route(
            "/v1/comments/:comment_id",
            get(get_comment_handler)
                .patch(update_comment_handler)
                .delete(delete_comment_handler),
        )
        .route("/v1/comments/:comment_id/status", put(moderate_handler))
        .with_state(service)
}

pub(crate) async fn create_comment_handler(
    State(service): State<Arc<CommentService>>,
    user: UserPrincipal,
    Path(property_id): Path<String>,
    ApiJson(input): ApiJson<CommentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let comment = service.create(&user.id, &PropertyId(property_id), input)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub(crate) async fn property_comments_handler(
    State(service): State<Arc<CommentService>>,
    Path(property_id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_property(&PropertyId(property_id), &page)?))
}

pub(crate) async fn admin_comments_handler(
    State(service): State<Arc<CommentService>>,
    admin: AdminPrincipal,
    ApiQuery(filter): ApiQuery<CommentFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Comments)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&filter, &page)?))
}

pub(crate) async fn my_comments_handler(
    State(service): State<Arc<CommentService>>,
    user: UserPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_user(&user.id, &page)?))
}

pub(crate) async fn builder_comments_handler(
    State(service): State<Arc<CommentService>>,
    builder: BuilderPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProperties)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.builder_inbox(&builder.id, &page)?))
}

pub(crate) async fn get_comment_handler(
    State(service): State<Arc<CommentService>>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.get(&CommentId(comment_id))?))
}

pub(crate) async fn update_comment_handler(
    State(service): State<Arc<CommentService>>,
    user: UserPrincipal,
    Path(comment_id): Path<String>,
    ApiJson(input): ApiJson<CommentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.update(&user.id, &CommentId(comment_id), input)?))
}

pub(crate) async fn delete_comment_handler(
    State(service): State<Arc<CommentService>>,
    user: UserPrincipal,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    service.delete(&user.id, &CommentId(comment_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn moderate_handler(
    State(service): State<Arc<CommentService>>,
    admin: AdminPrincipal,
    Path(comment_id): Path<String>,
    ApiJson(request): ApiJson<CommentModeration>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Comments)?;
    Ok(Json(service.moderate(&CommentId(comment_id), request.status)?))
}

/// Browsing history of the signed-in user.
pub fn property_view_router(service: Arc<PropertyViewService>) -> Router {
    Router::new()
        .route("/v1/property-views", post(track_view_handler))
        .route("/v1/property-views/me", get(my_views_handler))
        .route("/v1/property-views/me/stats", get(view_stats_handler))
        .route("/v1/property-views/me/most-viewed", get(most_viewed_handler))
        .with_state(service)
}

pub(crate) async fn track_view_handler(
    State(service): State<Arc<PropertyViewService>>,
    user: UserPrincipal,
    ApiJson(request): ApiJson<TrackView>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = service.track(&user.id, &request.property_id)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn my_views_handler(
    State(service): State<Arc<PropertyViewService>>,
    user: UserPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_user(&user.id, &page)?))
}

pub(crate) async fn view_stats_handler(
    State(service): State<Arc<PropertyViewService>>,
    user: UserPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.stats(&user.id)?))
}

pub(crate) async fn most_viewed_handler(
    State(service): State<Arc<PropertyViewService>>,
    user: UserPrincipal,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.most_viewed(&user.id, query.limit)?))
}
