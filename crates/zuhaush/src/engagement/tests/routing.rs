use axum::http::{Method, StatusCode};
use serde_json::json;

use super::common::*;
use crate::testing::{call, request};

#[tokio::test]
async fn like_toggle_round_trip_over_http() {
    let fx = fixture();
    let token = fx.user.tokens.access.token.clone();
    let uri = format!("/v1/properties/{}/like", fx.first.id);

    let (status, body) = call(
        fx.harness.router(),
        request(Method::POST, &uri, Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);
    assert_eq!(body["like_count"], 1);

    let (status, body) = call(
        fx.harness.router(),
        request(Method::POST, &uri, Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], false);
    assert_eq!(body["like_count"], 0);

    let (status, _) = call(fx.harness.router(), request(Method::POST, &uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_comment_listing_and_author_delete() {
    let fx = fixture();
    let token = fx.user.tokens.access.token.clone();
    let uri = format!("/v1/properties/{}/comments", fx.first.id);

    let (status, body) = call(
        fx.harness.router(),
        request(Method::POST, &uri, Some(&token), Some(json!({ "text": "Lovely balcony" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["id"].as_str().expect("id").to_string();

    let (status, body) = call(fx.harness.router(), request(Method::GET, &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["results"][0]["text"], "Lovely balcony");

    let (status, body) = call(
        fx.harness.router(),
        request(
            Method::DELETE,
            &format!("/v1/comments/{comment_id}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn moderation_requires_an_admin() {
    let fx = fixture();
    let comment = fx
        .harness
        .app
        .comments
        .create(
            &fx.user.user.id,
            &fx.first.id,
            crate::engagement::CommentInput {
                text: "Spam".to_string(),
            },
        )
        .expect("posted");
    let uri = format!("/v1/comments/{}/status", comment.id);
    let payload = json!({ "status": "inactive" });

    let user_token = fx.user.tokens.access.token.clone();
    let (status, _) = call(
        fx.harness.router(),
        request(Method::PUT, &uri, Some(&user_token), Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        fx.harness.router(),
        request(Method::PUT, &uri, Some(&fx.admin_token), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "inactive");
}

#[tokio::test]
async fn builder_inbox_is_served_to_builders() {
    let fx = fixture();
    fx.harness
        .app
        .comments
        .create(
            &fx.user.user.id,
            &fx.first.id,
            crate::engagement::CommentInput {
                text: "When is possession?".to_string(),
            },
        )
        .expect("posted");

    let (status, body) = call(
        fx.harness.router(),
        request(Method::GET, "/v1/comments/builder", Some(&fx.builder_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);
}

#[tokio::test]
async fn property_views_are_tracked_per_user() {
    let fx = fixture();
    let token = fx.user.tokens.access.token.clone();

    let (status, _) = call(
        fx.harness.router(),
        request(
            Method::POST,
            "/v1/property-views",
            Some(&token),
            Some(json!({ "property_id": fx.first.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        fx.harness.router(),
        request(Method::GET, "/v1/property-views/me/most-viewed?limit=5", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["view_count"], 1);

    let (status, _) = call(
        fx.harness.router(),
        request(Method::GET, "/v1/property-views/me/most-viewed?limit=0", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
