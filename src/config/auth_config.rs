use chrono::Duration;

/// Which second-factor strategy a deployment runs. The two are never mixed:
/// enrollment and login verification both go through the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorMode {
    /// Emailed one-time codes, verified against the token store.
    EmailCode,
    /// Authenticator-app codes derived from a per-user secret.
    Totp,
}

impl TwoFactorMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "email" | "email_code" => Some(Self::EmailCode),
            "totp" => Some(Self::Totp),
            _ => None,
        }
    }
}

/// Authentication policy knobs, threaded into the login flow as one value
/// instead of scattered globals. All thresholds and lifetimes live here.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Failed password checks before the account locks.
    pub max_login_attempts: i64,
    /// How long a lockout lasts once triggered.
    pub lockout_duration: Duration,
    /// Lifetime of a password-reset token.
    pub reset_token_ttl: Duration,
    /// Lifetime of an emailed one-time code.
    pub two_factor_code_ttl: Duration,
    /// Digits in an emailed one-time code.
    pub two_factor_code_digits: u32,
    pub two_factor_mode: TwoFactorMode,
    /// Issuer label baked into TOTP provisioning URIs.
    pub totp_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_duration: Duration::minutes(15),
            reset_token_ttl: Duration::hours(1),
            two_factor_code_ttl: Duration::minutes(5),
            two_factor_code_digits: 6,
            two_factor_mode: TwoFactorMode::EmailCode,
            totp_issuer: "AuthFlow".to_string(),
        }
    }
}
