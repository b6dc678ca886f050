use axum::http::StatusCode;
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

#[tokio::test]
async fn signup_creates_user_and_establishes_session() {
    let ctx = TestContext::new().await;
    let email = test_email();

    let response = ctx
        .server
        .post("/auth/signup")
        .json(&json!({
            "username": "ann",
            "email": &email,
            "password": "longenough1"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert!(body.get("access_token").is_some());
    assert!(body.get("refresh_token").is_some());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "ann");
    // No verification step in this design: accounts are born verified.
    assert_eq!(body["user"]["email_verified"], true);
    assert_eq!(body["user"]["two_factor_enabled"], false);

    assert_eq!(ctx.mailer.welcome_count(&email), 1);

    // The session is usable immediately.
    let me = ctx
        .server
        .get("/auth/me")
        .authorization_bearer(body["access_token"].as_str().unwrap())
        .await;
    me.assert_status(StatusCode::OK);
    let me_body: serde_json::Value = me.json();
    assert_eq!(me_body["email"], email.as_str());
}

#[tokio::test]
async fn signup_with_duplicate_email_returns_conflict() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/signup")
        .json(&json!({
            "username": "first",
            "email": &email,
            "password": test_password()
        }))
        .await;

    let response = ctx
        .server
        .post("/auth/signup")
        .json(&json!({
            "username": "second",
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_with_duplicate_username_returns_conflict() {
    let ctx = TestContext::new().await;

    ctx.server
        .post("/auth/signup")
        .json(&json!({
            "username": "taken",
            "email": test_email(),
            "password": test_password()
        }))
        .await;

    let response = ctx
        .server
        .post("/auth/signup")
        .json(&json!({
            "username": "taken",
            "email": test_email(),
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_with_short_password_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/signup")
        .json(&json!({
            "username": "ann",
            "email": test_email(),
            "password": "short"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_with_invalid_email_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/signup")
        .json(&json!({
            "username": "ann",
            "email": "not-an-email",
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_with_malformed_username_returns_bad_request() {
    let ctx = TestContext::new().await;

    for username in [".ann", "ann.", "an", "we@ird"] {
        let response = ctx
            .server
            .post("/auth/signup")
            .json(&json!({
                "username": username,
                "email": test_email(),
                "password": test_password()
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
