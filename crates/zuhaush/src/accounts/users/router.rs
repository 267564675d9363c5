use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{NotificationSettings, UserId, UserPreferences};
use super::onboarding::{CompleteRegistrationRequest, CreatePasswordRequest};
use super::repository::UserFilter;
use super::service::{AdminUserUpdate, ProfileUpdate, UserService};
use crate::accounts::admins::AdminPermission;
use crate::accounts::requests::{
    ChangePasswordRequest, EmailRequest, LoginRequest, OtpRequest, RefreshRequest,
    ResetPasswordRequest,
};
use crate::auth::{AdminPrincipal, UserPrincipal};
use crate::catalog::PropertyId;
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<UserService>;

/// `/v1/auth` sign-up and session endpoints plus `/v1/users` profile and admin endpoints.
pub fn user_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/auth/check-email", post(check_email_handler))
        .route(
            "/v1/auth/send-registration-otp",
            post(send_registration_otp_handler),
        )
        .route(
            "/v1/auth/verify-registration-otp",
            post(verify_registration_otp_handler),
        )
        .route("/v1/auth/create-password", post(create_password_handler))
        .route(
            "/v1/auth/complete-registration",
            post(complete_registration_handler),
        )
        .route("/v1/auth/login", post(login_handler))
        .route("/v1/auth/login-with-otp", post(login_with_otp_handler))
        .route("/v1/auth/complete-login-otp", post(complete_login_otp_handler))
        .route("/v1/auth/forgot-password", post(forgot_password_handler))
        .route(
            "/v1/auth/verify-forgot-password-otp",
            post(verify_forgot_password_otp_handler),
        )
        .route("/v1/auth/reset-password", post(reset_password_handler))
        .route("/v1/auth/refresh-tokens", post(refresh_tokens_handler))
        .route("/v1/auth/logout", post(logout_handler))
        .route("/v1/users", get(list_handler))
        .route("/v1/users/stats", get(stats_handler))
        .route("/v1/users/me", get(me_handler).patch(update_me_handler))
        .route("/v1/users/me/change-password", post(change_password_handler))
        .route(
            "/v1/users/me/preferences",
            get(preferences_handler).put(update_preferences_handler),
        )
        .route(
            "/v1/users/me/notification-settings",
            get(notification_settings_handler).put(update_notification_settings_handler),
        )
        .route("/v1/users/me/shortlist", get(shortlist_handler))
        .route(
            "/v1/users/me/shortlist/:property_id",
            get(shortlist_check_handler)
                .post(shortlist_add_handler)
                .delete(shortlist_remove_handler),
        )
        .route(
            "/v1/users/:user_id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/v1/users/:user_id/activate", post(activate_handler))
        .route("/v1/users/:user_id/deactivate", post(deactivate_handler))
        .with_state(service)
}

pub(crate) async fn check_email_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.check_email(&request.email)?))
}

pub(crate) async fn send_registration_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatch = service.send_registration_otp(&request.email)?;
    Ok(Json(json!({
        "message": "OTP sent to your email",
        "email": dispatch.email,
        "expires_at": dispatch.expires_at,
    })))
}

pub(crate) async fn verify_registration_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<OtpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = service.verify_registration_otp(&request.email, &request.otp)?;
    Ok(Json(json!({ "message": "OTP verified", "user": user })))
}

pub(crate) async fn create_password_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<CreatePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = service.create_password(request)?;
    Ok(Json(json!({ "message": "Password created", "user": user })))
}

pub(crate) async fn complete_registration_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<CompleteRegistrationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let session = service.complete_registration(request)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub(crate) async fn login_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.login(&request.email, &request.password)?))
}

pub(crate) async fn login_with_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatch = service.login_with_otp(&request.email, &request.password)?;
    Ok(Json(json!({
        "message": "OTP sent to your email",
        "email": dispatch.email,
        "expires_at": dispatch.expires_at,
    })))
}

pub(crate) async fn complete_login_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<OtpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.complete_login_otp(&request.email, &request.otp)?))
}

pub(crate) async fn forgot_password_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatch = service.forgot_password(&request.email)?;
    Ok(Json(json!({
        "message": "Password reset OTP sent to your email",
        "email": dispatch.email,
        "expires_at": dispatch.expires_at,
    })))
}

pub(crate) async fn verify_forgot_password_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<OtpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.verify_forgot_password_otp(&request.email, &request.otp)?;
    Ok(Json(json!({ "message": "OTP verified" })))
}

pub(crate) async fn reset_password_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.reset_password(&request.email, &request.otp, &request.password)?;
    Ok(StatusCode::NO_CONTENT)
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
    user: UserPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.get(&user.id)?))
}

pub(crate) async fn update_me_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.update_profile(&user.id, update)?))
}

pub(crate) async fn change_password_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.change_password(&user.id, &request.current_password, &request.new_password)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn preferences_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.get(&user.id)?.preferences))
}

pub(crate) async fn update_preferences_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiJson(preferences): ApiJson<UserPreferences>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.update_preferences(&user.id, preferences)?))
}

pub(crate) async fn notification_settings_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.get(&user.id)?.notification_settings))
}

pub(crate) async fn update_notification_settings_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiJson(settings): ApiJson<NotificationSettings>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.update_notification_settings(&user.id, settings)?))
}

pub(crate) async fn shortlist_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.shortlist(&user.id)?))
}

pub(crate) async fn shortlist_check_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let shortlisted = service.is_shortlisted(&user.id, &PropertyId(property_id))?;
    Ok(Json(json!({ "shortlisted": shortlisted })))
}

pub(crate) async fn shortlist_add_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let shortlist = service.add_to_shortlist(&user.id, &PropertyId(property_id))?;
    Ok((StatusCode::CREATED, Json(json!({ "shortlist": shortlist }))))
}

pub(crate) async fn shortlist_remove_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let shortlist = service.remove_from_shortlist(&user.id, &PropertyId(property_id))?;
    Ok(Json(json!({ "shortlist": shortlist })))
}

pub(crate) async fn list_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiQuery(filter): ApiQuery<UserFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&filter, &page)?))
}

pub(crate) async fn stats_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    Ok(Json(service.stats()?))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    Ok(Json(service.get(&UserId(user_id))?))
}

pub(crate) async fn update_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<AdminUserUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    Ok(Json(service.admin_update(&UserId(user_id), update)?))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    service.delete(&UserId(user_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn activate_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    Ok(Json(service.set_active(&UserId(user_id), true)?))
}

pub(crate) async fn deactivate_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Users)?;
    Ok(Json(service.set_active(&UserId(user_id), false)?))
}
