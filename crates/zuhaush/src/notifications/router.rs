use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{NewNotification, NotificationId, Recipient, RecipientKind, SenderKind};
use super::service::{NotificationFilter, NotificationService};
use crate::accounts::admins::AdminPermission;
use crate::auth::{AdminPrincipal, AnyPrincipal};
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<NotificationService>;

/// Inbox endpoints for users and builders plus the admin broadcast console.
pub fn notification_router(service: SharedService) -> Router {
    Router::new()
        .route(
            "/v1/notifications",
            get(list_handler).delete(delete_all_handler),
        )
        .route("/v1/notifications/unread-count", get(unread_count_handler))
        .route("/v1/notifications/read-all", post(mark_all_read_handler))
        .route("/v1/notifications/admin", post(admin_create_handler))
        .route("/v1/notifications/admin/stats", get(admin_stats_handler))
        .route(
            "/v1/notifications/admin/recipients/:recipient_kind/:recipient_id",
            get(admin_recipient_handler),
        )
        .route(
            "/v1/notifications/:notification_id",
            get(get_handler).delete(delete_handler),
        )
        .route(
            "/v1/notifications/:notification_id/read",
            post(mark_read_handler),
        )
        .with_state(service)
}

pub(crate) fn inbox_of(principal: &AnyPrincipal) -> Result<Recipient, ServiceError> {
    match principal {
        AnyPrincipal::User(user) => Ok(Recipient::user(&user.id)),
        AnyPrincipal::Builder(builder) => Ok(Recipient::builder(&builder.id)),
        AnyPrincipal::Admin(_) => Err(ServiceError::forbidden(
            "Admins do not have a notification inbox",
        )),
    }
}

pub(crate) async fn list_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&recipient, &filter, &page)?))
}

pub(crate) async fn unread_count_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    let count = service.unread_count(&recipient)?;
    Ok(Json(json!({ "unread_count": count })))
}

pub(crate) async fn mark_all_read_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    let updated = service.mark_all_read(&recipient)?;
    Ok(Json(json!({ "updated": updated })))
}

pub(crate) async fn delete_all_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    let deleted = service.delete_all(&recipient)?;
    Ok(Json(json!({ "deleted": deleted })))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    Ok(Json(
        service.get(&recipient, &NotificationId(notification_id))?,
    ))
}

pub(crate) async fn mark_read_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    Ok(Json(
        service.mark_read(&recipient, &NotificationId(notification_id))?,
    ))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let recipient = inbox_of(&principal)?;
    service.delete(&recipient, &NotificationId(notification_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn admin_create_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiJson(input): ApiJson<NewNotification>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Messages)?;
    let input = input.from_sender(SenderKind::Admin, admin.id.to_string());
    let notification = service.notify(input)?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub(crate) async fn admin_recipient_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path((recipient_kind, recipient_id)): Path<(RecipientKind, String)>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Messages)?;
    let recipient = Recipient {
        kind: recipient_kind,
        id: recipient_id,
    };
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(
        &recipient,
        &NotificationFilter::default(),
        &page,
    )?))
}

pub(crate) async fn admin_stats_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Messages)?;
    Ok(Json(service.stats()?))
}
