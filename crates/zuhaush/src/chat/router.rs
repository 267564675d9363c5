use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use super::service::{ChatParty, ChatService, SendMessage, DEFAULT_HISTORY_LIMIT};
use crate::accounts::builders::TeamPermission;
use crate::auth::AnyPrincipal;
use crate::error::ServiceError;
use crate::http::{ApiJson, ApiQuery};
use crate::pagination::{PageQuery, PageRequest};

type SharedService = Arc<ChatService>;

/// Direct messages between users and builders.
pub fn chat_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/chat/messages", post(send_handler))
        .route("/v1/chat/conversations", get(conversations_handler))
        .route("/v1/chat/history/:counterpart_id", get(history_handler))
        .with_state(service)
}

fn party_of(principal: &AnyPrincipal) -> Result<ChatParty<'_>, ServiceError> {
    match principal {
        AnyPrincipal::User(user) => Ok(ChatParty::User(&user.id)),
        AnyPrincipal::Builder(builder) => {
            builder.require(TeamPermission::Messages)?;
            Ok(ChatParty::Builder(&builder.id))
        }
        AnyPrincipal::Admin(_) => Err(ServiceError::forbidden(
            "Chat is only available to users and builders",
        )),
    }
}

fn chat_page(query: &PageQuery) -> Result<PageRequest, ServiceError> {
    let page = PageRequest::from_query(query)?;
    Ok(match query.limit {
        Some(_) => page,
        None => page.with_default_limit(DEFAULT_HISTORY_LIMIT),
    })
}

pub(crate) async fn send_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    ApiJson(input): ApiJson<SendMessage>,
) -> Result<impl IntoResponse, ServiceError> {
    let party = party_of(&principal)?;
    let message = service.send(party, input)?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub(crate) async fn history_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    Path(counterpart_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let party = party_of(&principal)?;
    let page = chat_page(&query)?;
    Ok(Json(service.history(party, &counterpart_id, &page)?))
}

pub(crate) async fn conversations_handler(
    State(service): State<SharedService>,
    principal: AnyPrincipal,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let party = party_of(&principal)?;
    let page = chat_page(&query)?;
    Ok(Json(service.conversations(party, &page)?))
}
