use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BuilderId, DocumentId, TeamMemberId, TeamPermission};
use super::repository::BuilderFilter;
use super::service::{
    AdminBuilderUpdate, BuilderService, BuilderUpdate, DocumentInput, NewBuilder,
    NewTeamMember, TeamMemberUpdate,
};
use crate::accounts::admins::AdminPermission;
use crate::accounts::requests::{
    ChangePasswordRequest, EmailRequest, LoginRequest, OtpRequest, RefreshRequest,
    ResetPasswordRequest,
};
use crate::auth::{AdminPrincipal, BuilderPrincipal};
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<BuilderService>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewRequest {
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

/// Builder self-service (`/v1/builders/me`), auth, and the admin review console.
pub fn builder_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/builders/register-with-otp", post(register_handler))
        .route(
            "/v1/builders/verify-registration-otp",
            post(verify_registration_otp_handler),
        )
        .route("/v1/builders/login", post(login_handler))
        .route("/v1/builders/login-with-otp", post(login_with_otp_handler))
        .route(
            "/v1/builders/complete-login-otp",
            post(complete_login_otp_handler),
        )
        .route("/v1/builders/forgot-password", post(forgot_password_handler))
        .route(
            "/v1/builders/verify-forgot-password-otp",
            post(verify_forgot_password_otp_handler),
        )
        .route("/v1/builders/reset-password", post(reset_password_handler))
        .route("/v1/builders/refresh-tokens", post(refresh_tokens_handler))
        .route("/v1/builders/logout", post(logout_handler))
        .route(
            "/v1/builders/team-members/login",
            post(team_member_login_handler),
        )
        .route("/v1/builders", get(list_handler).post(create_handler))
        .route("/v1/builders/stats", get(stats_handler))
        .route("/v1/builders/me", get(me_handler).patch(update_me_handler))
        .route(
            "/v1/builders/me/change-password",
            post(change_password_handler),
        )
        .route("/v1/builders/me/submit-for-review", post(submit_handler))
        .route("/v1/builders/me/reset-to-draft", post(reset_to_draft_handler))
        .route("/v1/builders/me/documents", post(add_document_handler))
        .route(
            "/v1/builders/me/documents/:document_id",
            delete(remove_document_handler),
        )
        .route(
            "/v1/builders/me/team-members",
            get(team_members_handler).post(add_team_member_handler),
        )
        .route(
            "/v1/builders/me/team-members/:member_id",
            get(team_member_handler)
                .patch(update_team_member_handler)
                .delete(remove_team_member_handler),
        )
        .route(
            "/v1/builders/:builder_id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/v1/builders/:builder_id/approve", post(approve_handler))
        .route("/v1/builders/:builder_id/reject", post(reject_handler))
        .route("/v1/builders/:builder_id/activate", post(activate_handler))
        .route(
            "/v1/builders/:builder_id/deactivate",
            post(deactivate_handler),
        )
        .with_state(service)
}

fn otp_sent(message: &str, dispatch: crate::auth::OtpDispatch) -> Json<serde_json::Value> {
    Json(json!({
        "message": message,
        "email": dispatch.email,
        "expires_at": dispatch.expires_at,
    }))
}

pub(crate) async fn register_handler(
    State(service): State<SharedService>,
    ApiJson(input): ApiJson<NewBuilder>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatch = service.register_with_otp(input)?;
    Ok((
        StatusCode::CREATED,
        otp_sent("Registration OTP sent to your email", dispatch),
    ))
}

pub(crate) async fn verify_registration_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<OtpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        service.verify_registration_otp(&request.email, &request.otp)?,
    ))
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
    Ok(otp_sent("OTP sent to your email", dispatch))
}

pub(crate) async fn complete_login_otp_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<OtpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        service.complete_login_otp(&request.email, &request.otp)?,
    ))
}

pub(crate) async fn forgot_password_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatch = service.forgot_password(&request.email)?;
    Ok(otp_sent("Password reset OTP sent to your email", dispatch))
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

pub(crate) async fn team_member_login_handler(
    State(service): State<SharedService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        service.team_member_login(&request.email, &request.password)?,
    ))
}

pub(crate) async fn me_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProfile)?;
    Ok(Json(service.get(&builder.id)?))
}

pub(crate) async fn update_me_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiJson(update): ApiJson<BuilderUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProfile)?;
    Ok(Json(service.update_profile(&builder.id, update)?))
}

pub(crate) async fn change_password_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.change_password(&builder, &request.current_password, &request.new_password)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn submit_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProfile)?;
    Ok(Json(service.submit_for_review(&builder.id)?))
}

pub(crate) async fn reset_to_draft_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProfile)?;
    Ok(Json(service.reset_to_draft(&builder.id)?))
}

pub(crate) async fn add_document_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiJson(input): ApiJson<DocumentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProfile)?;
    let document = service.add_document(&builder.id, input)?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub(crate) async fn remove_document_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProfile)?;
    service.remove_document(&builder.id, &DocumentId(document_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn team_members_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Users)?;
    Ok(Json(service.team_members(&builder.id)?))
}

pub(crate) async fn add_team_member_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiJson(input): ApiJson<NewTeamMember>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Users)?;
    let member = service.add_team_member(&builder.id, input)?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub(crate) async fn team_member_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Users)?;
    Ok(Json(
        service.team_member(&builder.id, &TeamMemberId(member_id))?,
    ))
}

pub(crate) async fn update_team_member_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    Path(member_id): Path<String>,
    ApiJson(update): ApiJson<TeamMemberUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Users)?;
    Ok(Json(service.update_team_member(
        &builder.id,
        &TeamMemberId(member_id),
        update,
    )?))
}

pub(crate) async fn remove_team_member_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Users)?;
    service.remove_team_member(&builder.id, &TeamMemberId(member_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiQuery(filter): ApiQuery<BuilderFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&filter, &page)?))
}

pub(crate) async fn create_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiJson(input): ApiJson<NewBuilder>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    let builder = service.create(input)?;
    Ok((StatusCode::CREATED, Json(builder)))
}

pub(crate) async fn stats_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    Ok(Json(service.stats()?))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    Ok(Json(service.get(&BuilderId(builder_id))?))
}

pub(crate) async fn update_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
    ApiJson(update): ApiJson<AdminBuilderUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    Ok(Json(service.admin_update(&BuilderId(builder_id), update)?))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    service.delete(&BuilderId(builder_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn approve_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
    request: Option<ApiJson<ReviewRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    let notes = request.and_then(|ApiJson(request)| request.notes);
    Ok(Json(service.approve(
        &admin.id,
        &BuilderId(builder_id),
        notes.as_deref(),
    )?))
}

pub(crate) async fn reject_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    let notes = request.notes.unwrap_or_default();
    Ok(Json(service.reject(&admin.id, &BuilderId(builder_id), &notes)?))
}

pub(crate) async fn activate_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    Ok(Json(service.set_active(&BuilderId(builder_id), true)?))
}

pub(crate) async fn deactivate_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(builder_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Builders)?;
    Ok(Json(service.set_active(&BuilderId(builder_id), false)?))
}
