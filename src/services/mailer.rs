use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Outbound notifications. Fire-and-forget from the caller's perspective:
/// implementations log failures and never propagate them, so a mail outage
/// cannot fail a signup or a reset request.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset_email(&self, email: &str, token: &str);
    async fn send_welcome_email(&self, email: &str, username: &str);
    async fn send_two_factor_code(&self, email: &str, code: &str);
}

/// Resend HTTP API client.
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    app_url: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, app_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
            app_url,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: String) {
        let result = self
            .client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), subject, "email dispatch rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, subject, "email dispatch failed");
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_password_reset_email(&self, email: &str, token: &str) {
        let reset_link = format!("{}/reset-password?token={}", self.app_url, token);
        self.send(
            email,
            "Reset your password",
            format!(r#"<p>Click <a href="{reset_link}">here</a> to reset your password.</p>"#),
        )
        .await;
    }

    async fn send_welcome_email(&self, email: &str, username: &str) {
        self.send(
            email,
            "Welcome to AuthFlow!",
            format!("<p>Hi {username},</p><p>Welcome to AuthFlow! We're excited to have you on board.</p>"),
        )
        .await;
    }

    async fn send_two_factor_code(&self, email: &str, code: &str) {
        self.send(email, "Your 2FA Code", format!("<p>Your 2FA code is: {code}</p>"))
            .await;
    }
}

/// Stand-in when no mail credentials are configured: everything is logged,
/// nothing leaves the process.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset_email(&self, email: &str, _token: &str) {
        tracing::info!(email, "password reset email suppressed (no mailer configured)");
    }

    async fn send_welcome_email(&self, email: &str, _username: &str) {
        tracing::info!(email, "welcome email suppressed (no mailer configured)");
    }

    async fn send_two_factor_code(&self, email: &str, _code: &str) {
        tracing::info!(email, "two-factor code email suppressed (no mailer configured)");
    }
}
