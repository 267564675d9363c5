use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{master_time_slots, TimeSlot, VisitId};
use super::repository::VisitFilter;
use super::service::{
    CancelVisit, RescheduleVisit, ScheduleVisit, VisitCaller, VisitService, VisitUpdate,
};
use crate::accounts::admins::AdminPermission;
use crate::accounts::builders::TeamPermission;
use crate::auth::{AdminPrincipal, AnyPrincipal, BuilderPrincipal, UserPrincipal};
use crate::catalog::PropertyId;
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<VisitService>;

#[derive(Debug, Deserialize)]
pub(crate) struct DateQuery {
    pub(crate) date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SlotQuery {
    pub(crate) date: NaiveDate,
    pub(crate) time: TimeSlot,
}

/// Visit booking: public slot lookups, user bookings, builder and admin handling.
pub fn visit_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/visits", get(list_handler).post(schedule_handler))
        .route("/v1/visits/time-slots", get(time_slots_handler))
        .route(
            "/v1/visits/properties/:property_id/booked-slots",
            get(booked_slots_handler),
        )
        .route(
            "/v1/visits/properties/:property_id/check-availability",
            get(check_availability_handler),
        )
        .route("/v1/visits/mine", get(mine_handler))
        .route("/v1/visits/upcoming", get(upcoming_handler))
        .route("/v1/visits/stats", get(stats_handler))
        .route(
            "/v1/visits/scheduled-properties",
            get(scheduled_properties_handler),
        )
        .route("/v1/visits/builder", get(builder_handler))
        .route(
            "/v1/visits/:visit_id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/v1/visits/:visit_id/cancel", post(cancel_handler))
        .route("/v1/visits/:visit_id/reschedule", post(reschedule_handler))
        .route("/v1/visits/:visit_id/confirm", post(confirm_handler))
        .route("/v1/visits/:visit_id/complete", post(complete_handler))
        .with_state(service)
}

fn caller_of(principal: &AnyPrincipal) -> Result<VisitCaller<'_>, ServiceError> {
    match principal {
        AnyPrincipal::User(user) => Ok(VisitCaller::User(&user.id)),
        AnyPrincipal::Builder(builder) => {
            builder.require(TeamPermission::Dashboard)?;
            Ok(VisitCaller::Builder(&builder.id))
        }
        AnyPrincipal::Admin(admin) => {
            admin.require(AdminPermission::Appointments)?;
            Ok(VisitCaller::Admin(&admin.id))
        }
    }
}

pub(crate) async fn time_slots_handler() -> impl IntoResponse {
    Json(json!({ "time_slots": master_time_slots() }))
}

pub(crate) async fn booked_slots_handler(
    State(service): State<SharedService>,
    Path(property_id): Path<String>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        service.booked_slots(&PropertyId(property_id), query.date)?,
    ))
}

pub(crate) async fn check_availability_handler(
    State(service): State<SharedService>,
    Path(property_id): Path<String>,
    ApiQuery(query): ApiQuery<SlotQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.check_availability(
        &PropertyId(property_id),
        query.date,
        query.time,
    )?))
}

pub(crate) async fn schedule_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiJson(input): ApiJson<ScheduleVisit>,
) -> Result<impl IntoResponse, ServiceError> {
    let visit = service.schedule(&user.id, input)?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub(crate) async fn list_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiQuery(filter): ApiQuery<VisitFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Appointments)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&filter, &page)?))
}

pub(crate) async fn mine_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiQuery(filter): ApiQuery<VisitFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_user(&user.id, &filter, &page)?))
}

pub(crate) async fn upcoming_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.upcoming(&user.id, &page)?))
}

pub(crate) async fn stats_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.stats(&user.id)?))
}

pub(crate) async fn scheduled_properties_handler(
    State(service): State<SharedService>,
    user: UserPrincipal,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.scheduled_properties(&user.id, &page)?))
}

pub(crate) async fn builder_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiQuery(filter): ApiQuery<VisitFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Dashboard)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_builder(&builder.id, &filter, &page)?))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    Ok(Json(service.get(caller, &VisitId(visit_id))?))
}

pub(crate) async fn update_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
    ApiJson(update): ApiJson<VisitUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    Ok(Json(service.update(caller, &VisitId(visit_id), update)?))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    service.delete(caller, &VisitId(visit_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn cancel_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
    request: Option<ApiJson<CancelVisit>>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    let request = request.map(|ApiJson(request)| request).unwrap_or_default();
    Ok(Json(service.cancel(caller, &VisitId(visit_id), request)?))
}

pub(crate) async fn reschedule_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
    ApiJson(request): ApiJson<RescheduleVisit>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    Ok(Json(service.reschedule(caller, &VisitId(visit_id), request)?))
}

pub(crate) async fn confirm_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    Ok(Json(service.confirm(caller, &VisitId(visit_id))?))
}

pub(crate) async fn complete_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(visit_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = caller_of(&principal)?;
    Ok(Json(service.complete(caller, &VisitId(visit_id))?))
}
