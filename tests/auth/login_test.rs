use axum::http::StatusCode;
use serde_json::json;

use crate::common::{create_test_user, test_email, test_password, TestContext};

#[tokio::test]
async fn login_with_valid_credentials_returns_tokens() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body.get("access_token").is_some());
    assert!(body.get("refresh_token").is_some());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn login_with_invalid_password_returns_unauthorized() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": "WrongPassword123!"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_account_is_indistinguishable_from_wrong_password() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;

    let wrong_password = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": "WrongPassword123!"
        }))
        .await;

    let unknown_account = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "nonexistent@example.com",
            "password": test_password()
        }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_account.assert_status(StatusCode::UNAUTHORIZED);

    // Byte-identical bodies: no account-existence oracle.
    let a: serde_json::Value = wrong_password.json();
    let b: serde_json::Value = unknown_account.json();
    assert_eq!(a, b);
}

#[tokio::test]
async fn login_with_missing_fields_returns_unprocessable() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": test_email()
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx.server.post("/auth/login").json(&json!({})).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn successful_login_resets_failure_counter() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;

    for _ in 0..2 {
        ctx.server
            .post("/auth/login")
            .json(&json!({
                "email": &email,
                "password": "WrongPassword123!"
            }))
            .await;
    }

    let attempts: i64 = sqlx::query_scalar(
        "SELECT failed_login_attempts FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(attempts, 2);

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let attempts: i64 = sqlx::query_scalar(
        "SELECT failed_login_attempts FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(attempts, 0);
}
