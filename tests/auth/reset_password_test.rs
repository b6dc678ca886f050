use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::common::{create_test_user, test_password, TestContext};

const NEW_PASSWORD: &str = "BrandNewPassword456!";

async fn request_reset_token(ctx: &TestContext, email: &str) -> String {
    ctx.server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;

    ctx.mailer.last_reset_token(email).expect("reset mail sent")
}

async fn login(ctx: &TestContext, email: &str, password: &str) -> axum_test::TestResponse {
    ctx.server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "password": password
        }))
        .await
}

#[tokio::test]
async fn valid_token_resets_the_password_once() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;
    let token = request_reset_token(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD
        }))
        .await;
    response.assert_status(StatusCode::OK);

    login(&ctx, &email, test_password())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    login(&ctx, &email, NEW_PASSWORD)
        .await
        .assert_status(StatusCode::OK);

    // Consumed on success: the row is gone and the token is dead.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens")
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let replay = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": "YetAnotherPassword789!",
            "password_confirm": "YetAnotherPassword789!"
        }))
        .await;
    replay.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_redemptions_have_exactly_one_winner() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;
    let token = request_reset_token(&ctx, &email).await;

    let first = async {
        ctx.server
            .post("/auth/reset-password")
            .json(&json!({
                "token": &token,
                "password": "FirstWinner111!",
                "password_confirm": "FirstWinner111!"
            }))
            .await
    };
    let second = async {
        ctx.server
            .post("/auth/reset-password")
            .json(&json!({
                "token": &token,
                "password": "SecondWinner222!",
                "password_confirm": "SecondWinner222!"
            }))
            .await
    };

    let (a, b) = tokio::join!(first, second);

    let statuses = [a.status_code(), b.status_code()];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "exactly one redemption may succeed, got {statuses:?}"
    );
}

#[tokio::test]
async fn expired_token_is_rejected_and_password_unchanged() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;
    let token = request_reset_token(&ctx, &email).await;

    // Age the token past its one-hour lifetime.
    sqlx::query("UPDATE password_reset_tokens SET expires_at = ? WHERE token = ?")
        .bind(Utc::now() - Duration::minutes(1))
        .bind(&token)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("expired"));

    login(&ctx, &email, test_password())
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({
            "token": "0".repeat(64),
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mismatched_confirmation_is_rejected() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;
    let token = request_reset_token(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": NEW_PASSWORD,
            "password_confirm": "SomethingElseEntirely!"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn successful_reset_unlocks_a_locked_account() {
    let ctx = TestContext::new().await;
    let (email, _) = create_test_user(&ctx).await;

    for _ in 0..5 {
        login(&ctx, &email, "WrongPassword123!").await;
    }
    login(&ctx, &email, test_password())
        .await
        .assert_status(StatusCode::LOCKED);

    let token = request_reset_token(&ctx, &email).await;
    ctx.server
        .post("/auth/reset-password")
        .json(&json!({
            "token": &token,
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD
        }))
        .await
        .assert_status(StatusCode::OK);

    login(&ctx, &email, NEW_PASSWORD)
        .await
        .assert_status(StatusCode::OK);
}
