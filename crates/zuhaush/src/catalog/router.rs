use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{MediaId, Property, PropertyFlag, PropertyId};
use super::repository::PropertyFilter;
use super::service::{Editor, MediaInput, MediaUpdate, PropertyInput, PropertyService, PropertyUpdate};
use crate::accounts::admins::AdminPermission;
use crate::accounts::builders::{BuilderId, TeamPermission};
use crate::auth::{AdminPrincipal, AnyPrincipal, BuilderPrincipal};
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<PropertyService>;

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    pub(crate) reason: String,
}

/// Catalog endpoints: public discovery, builder listing management and admin review.
pub fn property_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/properties", get(search_handler).post(create_handler))
        .route("/v1/properties/all", get(admin_list_handler))
        .route("/v1/properties/mine", get(mine_handler))
        .route("/v1/properties/mine/stats", get(mine_stats_handler))
        .route("/v1/properties/featured", get(featured_handler))
        .route("/v1/properties/trending", get(trending_handler))
        .route("/v1/properties/new-launch", get(new_launch_handler))
        .route("/v1/properties/slug/:slug", get(slug_handler))
        .route(
            "/v1/properties/builder/:builder_id",
            get(builder_listing_handler),
        )
        .route(
            "/v1/properties/:property_id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/v1/properties/:property_id/media", post(add_media_handler))
        .route(
            "/v1/properties/:property_id/media/:media_id",
            patch(update_media_handler).delete(remove_media_handler),
        )
        .route(
            "/v1/properties/:property_id/flags/:flag",
            post(add_flag_handler).delete(remove_flag_handler),
        )
        .route("/v1/properties/:property_id/views", post(view_handler))
        .route(
            "/v1/properties/:property_id/inquiries",
            post(inquiry_handler),
        )
        .route("/v1/properties/:property_id/approve", post(approve_handler))
        .route("/v1/properties/:property_id/reject", post(reject_handler))
        .with_state(service)
}

fn editor_of(principal: &AnyPrincipal) -> Result<Editor<'_>, ServiceError> {
    match principal {
        AnyPrincipal::Builder(builder) => {
            builder.require(TeamPermission::MyProperties)?;
            Ok(Editor::Builder(&builder.id))
        }
        AnyPrincipal::Admin(admin) => {
            admin.require(AdminPermission::Properties)?;
            Ok(Editor::Admin(&admin.id))
        }
        AnyPrincipal::User(_) => Err(ServiceError::forbidden(
            "Only builders and admins can manage properties",
        )),
    }
}

/// Unlisted properties stay hidden from everyone but their builder and admins.
fn visible_to(property: Property, principal: Option<&AnyPrincipal>) -> Result<Property, ServiceError> {
    let allowed = property.is_listed()
        || match principal {
            Some(AnyPrincipal::Admin(_)) => true,
            Some(AnyPrincipal::Builder(builder)) => builder.id == property.builder_id,
            _ => false,
        };
    if allowed {
        Ok(property)
    } else {
        Err(ServiceError::not_found("Property not found"))
    }
}

pub(crate) async fn search_handler(
    State(service): State<SharedService>,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.search(&filter, &page)?))
}

pub(crate) async fn create_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiJson(input): ApiJson<PropertyInput>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProperties)?;
    let property = service.create(&builder.id, input)?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(crate) async fn admin_list_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Properties)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.list(&filter, &page)?))
}

pub(crate) async fn mine_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::MyProperties)?;
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.for_builder(&builder.id, &filter, &page)?))
}

pub(crate) async fn mine_stats_handler(
    State(service): State<SharedService>,
    builder: BuilderPrincipal,
) -> Result<impl IntoResponse, ServiceError> {
    builder.require(TeamPermission::Analytics)?;
    Ok(Json(service.builder_stats(&builder.id)?))
}

async fn flag_listing(
    service: SharedService,
    flag: PropertyFlag,
    page: PageQuery,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    Ok(Json(service.flagged(flag, &page)?))
}

pub(crate) async fn featured_handler(
    State(service): State<SharedService>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    flag_listing(service, PropertyFlag::Featured, page).await
}

pub(crate) async fn trending_handler(
    State(service): State<SharedService>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    flag_listing(service, PropertyFlag::Trending, page).await
}

pub(crate) async fn new_launch_handler(
    State(service): State<SharedService>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    flag_listing(service, PropertyFlag::NewLaunch, page).await
}

pub(crate) async fn slug_handler(
    State(service): State<SharedService>,
    principal: Option<AnyPrincipal>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let property = service.get_by_slug(&slug)?;
    Ok(Json(visible_to(property, principal.as_ref())?))
}

pub(crate) async fn builder_listing_handler(
    State(service): State<SharedService>,
    Path(builder_id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = PageRequest::from_query(&page)?;
    let filter = PropertyFilter {
        builder_id: Some(BuilderId(builder_id)),
        ..PropertyFilter::default()
    };
    Ok(Json(service.search(&filter, &page)?))
}

pub(crate) async fn get_handler(
    State(service): State<SharedService>,
    principal: Option<AnyPrincipal>,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let property = service.get(&PropertyId(property_id))?;
    Ok(Json(visible_to(property, principal.as_ref())?))
}

pub(crate) async fn update_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(property_id): Path<String>,
    ApiJson(update): ApiJson<PropertyUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let editor = editor_of(&principal)?;
    Ok(Json(service.update(editor, &PropertyId(property_id), update)?))
}

pub(crate) async fn delete_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let editor = editor_of(&principal)?;
    service.delete(editor, &PropertyId(property_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_media_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(property_id): Path<String>,
    ApiJson(input): ApiJson<MediaInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let editor = editor_of(&principal)?;
    let property = service.add_media(editor, &PropertyId(property_id), input)?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(crate) async fn update_media_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path((property_id, media_id)): Path<(String, String)>,
    ApiJson(update): ApiJson<MediaUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let editor = editor_of(&principal)?;
    Ok(Json(service.update_media(
        editor,
        &PropertyId(property_id),
        &MediaId(media_id),
        update,
    )?))
}

pub(crate) async fn remove_media_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path((property_id, media_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let editor = editor_of(&principal)?;
    Ok(Json(service.remove_media(
        editor,
        &PropertyId(property_id),
        &MediaId(media_id),
    )?))
}

pub(crate) async fn add_flag_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path((property_id, flag)): Path<(String, PropertyFlag)>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Properties)?;
    Ok(Json(service.set_flag(&PropertyId(property_id), flag, true)?))
}

pub(crate) async fn remove_flag_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path((property_id, flag)): Path<(String, PropertyFlag)>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Properties)?;
    Ok(Json(service.set_flag(&PropertyId(property_id), flag, false)?))
}

pub(crate) async fn view_handler(
    State(service): State<SharedService>,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let views = service.record_view(&PropertyId(property_id))?;
    Ok(Json(json!({ "views": views })))
}

pub(crate) async fn inquiry_handler(
    State(service): State<SharedService>,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let inquiries = service.record_inquiry(&PropertyId(property_id))?;
    Ok(Json(json!({ "inquiries": inquiries })))
}

pub(crate) async fn approve_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Properties)?;
    Ok(Json(service.approve(&admin.id, &PropertyId(property_id))?))
}

pub(crate) async fn reject_handler(
    State(service): State<SharedService>,
    admin: AdminPrincipal,
    Path(property_id): Path<String>,
    ApiJson(request): ApiJson<RejectRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    admin.require(AdminPermission::Properties)?;
    Ok(Json(service.reject(
        &admin.id,
        &PropertyId(property_id),
        &request.reason,
    )?))
}
