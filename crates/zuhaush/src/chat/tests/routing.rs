use axum::http::{Method, StatusCode};
use serde_json::json;

use super::common::*;
use crate::testing::{call, request};

#[tokio::test]
async fn users_and_builders_message_each_other() {
    let fx = fixture();
    let user_token = fx.user.tokens.access.token.clone();
    let builder_token = fx.builder.tokens.access.token.clone();

    let (status, body) = call(
        fx.harness.router(),
        request(
            Method::POST,
            "/v1/chat/messages",
            Some(&user_token),
            Some(json!({ "recipient_id": fx.builder.builder.id, "message": "Hello" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sender"], "user");

    let uri = format!("/v1/chat/history/{}", fx.user.user.id);
    let (status, body) = call(
        fx.harness.router(),
        request(Method::GET, &uri, Some(&builder_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 50);
    assert_eq!(body["results"][0]["body"], "Hello");

    let (status, body) = call(
        fx.harness.router(),
        request(Method::GET, "/v1/chat/conversations", Some(&builder_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);
}

#[tokio::test]
async fn admins_cannot_chat() {
    let fx = fixture();
    let admin = fx.harness.super_admin();
    let (status, _) = call(
        fx.harness.router(),
        request(
            Method::GET,
            "/v1/chat/conversations",
            Some(&admin.tokens.access.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        fx.harness.router(),
        request(Method::GET, "/v1/chat/conversations", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
