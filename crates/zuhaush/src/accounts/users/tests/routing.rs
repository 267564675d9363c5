use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::testing::{call, request, Harness, PASSWORD};

#[tokio::test]
async fn registration_over_http_returns_a_session() {
    let harness = Harness::new();
    let email = "asha@example.com";

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/send-registration-otp",
            None,
            Some(json!({ "email": email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email);

    let (status, _) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/verify-registration-otp",
            None,
            Some(json!({ "email": email, "otp": harness.last_code(email) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/create-password",
            None,
            Some(json!({ "email": email, "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/complete-registration",
            None,
            Some(json!({
                "email": email,
                "name": "Asha Verma",
                "contact_number": "+919876543210",
                "city_of_interest": "Pune",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["registration_status"], "completed");
    assert!(body["user"].get("password_hash").is_none());
    let token = body["tokens"]["access"]["token"]
        .as_str()
        .expect("access token")
        .to_string();

    let (status, body) = call(
        harness.router(),
        request(Method::GET, "/v1/users/me", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email);
}

#[tokio::test]
async fn wrong_otp_is_rejected() {
    let harness = Harness::new();
    harness
        .app
        .users
        .send_registration_otp("asha@example.com")
        .expect("otp sent");
    let code = harness.last_code("asha@example.com");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/verify-registration-otp",
            None,
            Some(json!({ "email": "asha@example.com", "otp": wrong })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid OTP");
}

#[tokio::test]
async fn login_and_shortlist_over_http() {
    let harness = Harness::new();
    harness.registered_user("asha@example.com");

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": "wrong-pass1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect email or password");

    let (status, body) = call(
        harness.router(),
        request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["tokens"]["access"]["token"]
        .as_str()
        .expect("access token")
        .to_string();

    let (status, body) = call(
        harness.router(),
        request(Method::GET, "/v1/users/me/shortlist", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = call(
        harness.router(),
        request(Method::POST, "/v1/users/me/shortlist/missing", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_administration_requires_an_admin() {
    let harness = Harness::new();
    let user = harness.registered_user("asha@example.com");
    let admin = harness.super_admin();

    let (status, _) = call(
        harness.router(),
        request(Method::GET, "/v1/users", Some(&user.tokens.access.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        harness.router(),
        request(
            Method::GET,
            "/v1/users?sort_by=email:asc",
            Some(&admin.tokens.access.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);

    let (status, body) = call(
        harness.router(),
        request(
            Method::GET,
            "/v1/users/stats",
            Some(&admin.tokens.access.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], 1);
}
