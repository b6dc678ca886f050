use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use sqlx::sqlite::SqlitePoolOptions;

use authflow::config::{AuthConfig, DbPool};
use authflow::services::advisor::AdvisorClient;
use authflow::services::jwt::JwtService;
use authflow::services::mailer::Mailer;

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub db: DbPool,
    pub mailer: Arc<RecordingMailer>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(AuthConfig::default()).await
    }

    pub async fn with_config(auth_config: AuthConfig) -> Self {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory SQLite");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let jwt_service = JwtService::new("test-secret-key-for-testing-only".to_string());
        let mailer = Arc::new(RecordingMailer::default());
        let advisor = AdvisorClient::new(None, None);

        let app = authflow::create_app(
            db.clone(),
            jwt_service,
            mailer.clone(),
            advisor,
            auth_config,
        )
        .await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, db, mailer }
    }
}

/// Captures outbound mail instead of sending it, so tests can read one-time
/// codes and reset tokens the way a user would read their inbox.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum SentMail {
    Welcome { to: String },
    PasswordReset { to: String, token: String },
    TwoFactorCode { to: String, code: String },
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn last_two_factor_code(&self, to: &str) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|m| match m {
            SentMail::TwoFactorCode { to: t, code } if t == to => Some(code.clone()),
            _ => None,
        })
    }

    pub fn last_reset_token(&self, to: &str) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|m| match m {
            SentMail::PasswordReset { to: t, token } if t == to => Some(token.clone()),
            _ => None,
        })
    }

    pub fn welcome_count(&self, to: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m, SentMail::Welcome { to: t } if t == to))
            .count()
    }

    pub fn two_factor_code_count(&self, to: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m, SentMail::TwoFactorCode { to: t, .. } if t == to))
            .count()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset_email(&self, email: &str, token: &str) {
        self.sent.lock().unwrap().push(SentMail::PasswordReset {
            to: email.to_string(),
            token: token.to_string(),
        });
    }

    async fn send_welcome_email(&self, email: &str, _username: &str) {
        self.sent.lock().unwrap().push(SentMail::Welcome {
            to: email.to_string(),
        });
    }

    async fn send_two_factor_code(&self, email: &str, code: &str) {
        self.sent.lock().unwrap().push(SentMail::TwoFactorCode {
            to: email.to_string(),
            code: code.to_string(),
        });
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

/// Registers a user and returns (email, access_token).
#[allow(dead_code)]
pub async fn create_test_user(ctx: &TestContext) -> (String, String) {
    let email = test_email();

    let response = ctx
        .server
        .post("/auth/signup")
        .json(&serde_json::json!({
            "username": format!("user_{}", &email[5..13]),
            "email": &email,
            "password": test_password()
        }))
        .await;

    let body: serde_json::Value = response.json();
    let access_token = body["access_token"].as_str().unwrap_or_default().to_string();

    (email, access_token)
}
