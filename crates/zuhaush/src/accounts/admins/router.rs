use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AdminId, AdminPermission, AdminPermissions};
use super::service::{AdminService, AdminUpdate, NewAdmin};
use crate::accounts::requests::{ChangePasswordRequest, LoginRequest, RefreshRequest};
use crate::auth::AdminPrincipal;
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<AdminService>;

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRequest {
    pub(crate) name: String,
}

/// Admin console accounts. Creating, deleting and re-permissioning admins is reserved
/// for super admins; reading them needs the `settings` section.
pub fn admin_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/admins/login", post(login_handler))
        .route("/v1/admins/refresh-tokens", post(refresh_tokens_handler))
        .route("/v1/admins/logout", post(logout_handler))
        .route("/v1/admins", get(list_handler).post(create_handler))
        .route("/v1/admins/stats", get(stats_handler))
        .route("/v1/admins/me", get(me_handler).patch(update_me_handler))
        .route("/v1/admins/me/change-password", post(change_password_handler))
        .route(
            "/v1/admins/me/permissions/:permission",
            get(permission_check_handler),
        )
        .route(
            "/v1/admins/:admin_id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route(
            "/v1/admins/:admin_id/permissions",
            get(permissions_handler).put(update_permissions_handler),
        )
        .route("/v1/admins/:admin_id/activate", post(activate_handler))
        .route("/v1/admins/:admin_id/deactivate", post(deactivate_handler))
        .with_state(service)
}

pub(crate) async fn login_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.login(&request.email, &request.password)?))
}

pub(crate) async fn refresh_tokens_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.refresh_tokens(&request.refresh_token)?))
}

pub(crate) async fn logout_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.logout(&request.refresh_token)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn me_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.get(&admin.id)?))
}

pub(crate) async fn update_me_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.update_profile(&admin.id, &request.name)?))
}

pub(crate) async fn change_password_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.change_password(&admin.id, &request.current_password, &request.new_password)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn permission_check_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(permission): Path<AdminPermission>,
) -> Result<impl IntoResponse, ServiceError> {
    let allowed = service.has_permission(&admin.id, permission)?;
    Ok(Json(json!({ "permission": permission, "allowed": allowed })))
}

pub(crate) async fn list_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&page)?))
}

pub(crate) async fn create_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiJson(input): ApiJson<NewAdmin>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require_super_admin()?;
    let created = service.create(input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn stats_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    Ok(Json(service.stats()?))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    Ok(Json(service.get(&AdminId(admin_id))?))
}

pub(crate) async fn update_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
    ApiJson(update): ApiJson<AdminUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require_super_admin()?;
    Ok(Json(service.update(&AdminId(admin_id), update)?))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require_super_admin()?;
    service.delete(&admin.id, &AdminId(admin_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn permissions_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    Ok(Json(service.permissions(&AdminId(admin_id))?))
}

pub(crate) async fn update_permissions_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
    ApiJson(permissions): ApiJson<AdminPermissions>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require_super_admin()?;
    Ok(Json(
        service.update_permissions(&AdminId(admin_id), permissions)?,
    ))
}

pub(crate) async fn activate_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require_super_admin()?;
    Ok(Json(service.set_active(&admin.id, &AdminId(admin_id), true)?))
}

pub(crate) async fn deactivate_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require_super_admin()?;
    Ok(Json(service.set_active(&admin.id, &AdminId(admin_id), false)?))
}
