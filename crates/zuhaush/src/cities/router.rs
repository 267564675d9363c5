use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::domain::CityId;
use super::service::{CityService, CityUpdate, NewCity};
use crate::accounts::admins::AdminPermission;
use crate::auth::AdminPrincipal;
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<CityService>;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    pub(crate) q: String,
}

pub fn city_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/cities", get(active_handler).post(create_handler))
        .route("/v1/cities/search", get(search_handler))
        .route(
            "/v1/cities/:city_id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .with_state(service)
}

pub(crate) async fn active_handler(
    State(service): State<SharedService>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.active()?))
}

pub(crate) async fn search_handler(
    State(service): State<SharedService>,
    ApiQuery(query): ApiQuery<SearchQuery>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.search(&query.q, &page)?))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    Path(city_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.get(&CityId(city_id))?))
}

pub(crate) async fn create_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiJson(input): ApiJson<NewCity>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    let city = service.create(input)?;
    Ok((StatusCode::CREATED, Json(city)))
}

pub(crate) async fn update_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(city_id): Path<String>,
    ApiJson(update): ApiJson<CityUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    Ok(Json(service.update(&CityId(city_id), update)?))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(city_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Settings)?;
    service.delete(&CityId(city_id))?;
    Ok(StatusCode::NO_CONTENT)
}
