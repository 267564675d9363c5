use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::testing::{call, request, Harness, PASSWORD};

#[tokio::test]
async fn self_registration_over_http() {
    let harness = Harness::new();
    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/builders/register-with-otp",
            None,
            Some(json!({
                "name": "Skyline Developers",
                "email": "sales@skyline.test",
                "password": PASSWORD,
                "company": "Skyline Developers Pvt Ltd",
                "city": "Pune",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "sales@skyline.test");

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/builders/verify-registration-otp",
            None,
            Some(json!({
                "email": "sales@skyline.test",
                "otp": harness.last_code("sales@skyline.test"),
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["builder"]["status"], "draft");
    assert_eq!(body["builder"]["company"], "Skyline Developers Pvt Ltd");
    let token = body["tokens"]["access"]["token"]
        .as_str()
        .expect("access token")
        .to_string();

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/builders/me/submit-for-review",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "submitted");
}

#[tokio::test]
async fn admin_reviews_builders_over_http() {
    let harness = Harness::new();
    let admin = harness.super_admin();
    let builder = harness.verified_builder("sales@skyline.test");
    let approve = format!("/v1/builders/{}/approve", builder.builder.id);

    let (status, body) = call(
        harness.router(),
        request(Method::POST, &approve, Some(&admin.tokens.access.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status transition from draft to approved");

    harness
        .app
        .builders
        .submit_for_review(&builder.builder.id)
        .expect("submitted");
    let (status, _) = call(
        harness.router(),
        request(Method::POST, &approve, Some(&builder.tokens.access.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            &approve,
            Some(&admin.tokens.access.token),
            Some(json!({ "notes": "Verified RERA" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["admin_decision"]["notes"], "Verified RERA");
}

#[tokio::test]
async fn team_permissions_gate_dashboard_sections() {
    let harness = Harness::new();
    let owner = harness.verified_builder("sales@skyline.test");

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/builders/me/team-members",
            Some(&owner.tokens.access.token),
            Some(json!({
                "name": "Kiran Rao",
                "email": "kiran@skyline.test",
                "password": "memb3r-pass",
                "permissions": { "users": false },
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["permissions"]["users"], false);
    assert_eq!(body["permissions"]["dashboard"], true);

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/builders/team-members/login",
            None,
            Some(json!({ "email": "kiran@skyline.test", "password": "memb3r-pass" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let member_token = body["tokens"]["access"]["token"]
        .as_str()
        .expect("access token")
        .to_string();

    let (status, _) = call(
        harness.router(),
        request(
            Method::GET,
            "/v1/builders/me/team-members",
            Some(&member_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        harness.router(),
        request(Method::GET, "/v1/builders/me", Some(&member_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "sales@skyline.test");
}
