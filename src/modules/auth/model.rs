use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub failed_login_attempts: i64,
    pub locked_until: Option<DateTime<Utc>>,
    pub two_factor_enabled: bool,
    /// Base32 TOTP secret. Only meaningful in the TOTP strategy; stored
    /// pending until a correct code confirms enrollment.
    pub two_factor_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Emailed one-time login code. At most one live row per email: issuing a
/// new code deletes any predecessor first.
#[derive(Debug, Clone, FromRow)]
pub struct TwoFactorToken {
    pub id: String,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One-shot marker meaning "this user just passed the second factor".
/// Session establishment consumes it exactly once.
#[derive(Debug, Clone, FromRow)]
pub struct TwoFactorConfirmation {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
