use axum::http::StatusCode;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, AuthError>;

/// Every failure the authentication flows can hand back to a caller.
/// Wrong-password and unknown-account deliberately share one variant (and
/// one message) so responses never reveal whether an account exists.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account locked. Try again after {}.", .until.format("%H:%M:%S UTC"))]
    AccountLocked { until: DateTime<Utc> },

    #[error("Invalid one-time code")]
    InvalidCode,

    #[error("Your code expired. A new one has been sent to your email.")]
    CodeExpired,

    #[error("Invalid or already used token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("An account with this email or username already exists")]
    Conflict,

    #[error("Two-factor verification required")]
    TwoFactorRequired,

    #[error("Two-factor authentication is not enabled")]
    TwoFactorNotEnabled,

    #[error("Two-factor authentication is already enabled")]
    TwoFactorAlreadyEnabled,

    #[error("Service temporarily unavailable")]
    Unavailable,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountLocked { .. } => StatusCode::LOCKED,
            Self::InvalidCode => StatusCode::UNAUTHORIZED,
            Self::CodeExpired => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::TokenExpired => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::TwoFactorRequired => StatusCode::UNAUTHORIZED,
            Self::TwoFactorNotEnabled => StatusCode::BAD_REQUEST,
            Self::TwoFactorAlreadyEnabled => StatusCode::BAD_REQUEST,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Backend faults never leak details to callers: log, answer `Unavailable`.
/// Unique-constraint violations are the one mapped business failure.
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AuthError::Conflict;
            }
        }
        tracing::error!(error = %err, "database fault");
        AuthError::Unavailable
    }
}
