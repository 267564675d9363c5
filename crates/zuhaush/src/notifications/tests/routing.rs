use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::testing::{call, request, Harness};

#[tokio::test]
async fn admin_broadcast_lands_in_the_user_inbox() {
    let harness = Harness::new();
    let user = harness.registered_user("asha@example.com");
    let admin = harness.super_admin();
    let user_token = user.tokens.access.token.clone();

    let (_, before) = call(
        harness.router(),
        request(Method::GET, "/v1/notifications/unread-count", Some(&user_token), None),
    )
    .await;
    let before = before["unread_count"].as_u64().expect("count");

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/notifications/admin",
            Some(&admin.tokens.access.token),
            Some(json!({
                "recipient": { "kind": "user", "id": user.user.id },
                "title": "Maintenance tonight",
                "description": "The site will be read-only from 1 AM.",
                "notification_type": "system_announcement",
                "priority": "high",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sender"], "admin");
    let notification_id = body["id"].as_str().expect("id").to_string();

    let (status, body) = call(
        harness.router(),
        request(Method::GET, "/v1/notifications/unread-count", Some(&user_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"].as_u64(), Some(before + 1));

    let uri = format!("/v1/notifications/{notification_id}/read");
    let (status, body) = call(
        harness.router(),
        request(Method::POST, &uri, Some(&user_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);

    let uri = format!("/v1/notifications/admin/recipients/user/{}", user.user.id);
    let (status, body) = call(
        harness.router(),
        request(Method::GET, &uri, Some(&admin.tokens.access.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"].as_u64(), Some(before + 1));
}

#[tokio::test]
async fn admins_have_no_inbox_and_users_cannot_broadcast() {
    let harness = Harness::new();
    let user = harness.registered_user("asha@example.com");
    let admin = harness.super_admin();

    let (status, _) = call(
        harness.router(),
        request(Method::GET, "/v1/notifications", Some(&admin.tokens.access.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/notifications/admin",
            Some(&user.tokens.access.token),
            Some(json!({
                "recipient": { "kind": "user", "id": user.user.id },
                "title": "Hi",
                "description": "Hi",
                "notification_type": "general",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
