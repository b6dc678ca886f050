use std::env;

use crate::config::auth_config::{AuthConfig, TwoFactorMode};

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub app_url: String,
    pub email_from: String,
    pub resend_api_key: Option<String>,
    pub advisor_api_url: Option<String>,
    pub advisor_api_key: Option<String>,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://authflow.db".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let email_from = env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "AuthFlow <no-reply@authflow.dev>".to_string());

        // Outbound email is best-effort; without a key the mailer only logs.
        let resend_api_key = env::var("RESEND_API_KEY").ok();

        let advisor_api_url = env::var("ADVISOR_API_URL").ok();
        let advisor_api_key = env::var("ADVISOR_API_KEY").ok();

        let mut auth = AuthConfig::default();
        if let Ok(mode) = env::var("TWO_FACTOR_MODE") {
            auth.two_factor_mode = TwoFactorMode::parse(&mode)
                .ok_or_else(|| format!("Unknown TWO_FACTOR_MODE: {mode}"))?;
        }

        Ok(Self {
            database_url,
            jwt_secret,
            app_url,
            email_from,
            resend_api_key,
            advisor_api_url,
            advisor_api_key,
            auth,
        })
    }
}
