use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::config::{AuthConfig, TwoFactorMode};
use crate::modules::auth::crud::TwoFactorTokenStore;
use crate::modules::auth::interface::{AuthError, Result};
use crate::modules::auth::model::User;
use crate::services::mailer::Mailer;

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_SKEW: u8 = 1;
const TOTP_SECRET_LEN: usize = 20;

/// What the client needs to complete enrollment.
#[derive(Debug)]
pub enum EnrollmentChallenge {
    /// Secret plus provisioning URI for the authenticator app.
    Totp { secret: String, otpauth_url: String },
    /// A one-time code is on its way to the account's email.
    CodeSent,
}

/// One engine, two strategies. A deployment runs exactly one of them for
/// both enrollment and login verification.
pub struct TwoFactorEngine {
    mode: TwoFactorMode,
    tokens: TwoFactorTokenStore,
    mailer: Arc<dyn Mailer>,
    config: AuthConfig,
}

impl TwoFactorEngine {
    pub fn new(tokens: TwoFactorTokenStore, mailer: Arc<dyn Mailer>, config: AuthConfig) -> Self {
        Self {
            mode: config.two_factor_mode,
            tokens,
            mailer,
            config,
        }
    }

    /// Kick off the second step of a password-verified login. TOTP clients
    /// generate their own codes, so only the email strategy sends anything.
    pub async fn issue_challenge(&self, user: &User) -> Result<()> {
        match self.mode {
            TwoFactorMode::EmailCode => {
                self.issue_and_send(&user.email).await?;
                Ok(())
            }
            TwoFactorMode::Totp => Ok(()),
        }
    }

    /// Verify a second-factor code for this user.
    pub async fn verify(&self, user: &User, code: &str) -> Result<()> {
        match self.mode {
            TwoFactorMode::EmailCode => self.redeem_email_code(&user.email, code).await,
            TwoFactorMode::Totp => {
                let secret = user
                    .two_factor_secret
                    .as_deref()
                    .ok_or(AuthError::TwoFactorNotEnabled)?;
                if verify_totp(code, secret, &user.email, &self.config.totp_issuer)? {
                    Ok(())
                } else {
                    Err(AuthError::InvalidCode)
                }
            }
        }
    }

    /// First enrollment step. The caller persists the pending TOTP secret;
    /// `two_factor_enabled` flips only after a correct code comes back.
    pub async fn begin_enrollment(&self, user: &User) -> Result<EnrollmentChallenge> {
        match self.mode {
            TwoFactorMode::Totp => {
                let secret = generate_secret();
                let otpauth_url = key_uri(&secret, &user.email, &self.config.totp_issuer)?;
                Ok(EnrollmentChallenge::Totp {
                    secret,
                    otpauth_url,
                })
            }
            TwoFactorMode::EmailCode => {
                self.issue_and_send(&user.email).await?;
                Ok(EnrollmentChallenge::CodeSent)
            }
        }
    }

    async fn issue_and_send(&self, email: &str) -> Result<()> {
        let token = self
            .tokens
            .issue(
                email,
                self.config.two_factor_code_digits,
                self.config.two_factor_code_ttl,
            )
            .await?;
        self.mailer.send_two_factor_code(email, &token.code).await;
        Ok(())
    }

    /// Redeem an emailed code. A mismatched code fails outright; an expired
    /// one retries rather than dead-ends: the stale row is replaced and a
    /// fresh code goes out before the caller sees `CodeExpired`.
    async fn redeem_email_code(&self, email: &str, code: &str) -> Result<()> {
        let token = self
            .tokens
            .find_by_email(email)
            .await
            .ok_or(AuthError::InvalidCode)?;

        if token.code != code {
            return Err(AuthError::InvalidCode);
        }

        if Utc::now() > token.expires_at {
            self.tokens.delete(&token.id).await?;
            self.issue_and_send(email).await?;
            return Err(AuthError::CodeExpired);
        }

        // Conditional delete: of two concurrent redemptions, one wins.
        if self.tokens.claim(&token.id, code).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidCode)
        }
    }
}

/// Fresh 160-bit secret, base32 without padding (what authenticator apps
/// and `Secret::Encoded` expect).
pub fn generate_secret() -> String {
    let mut raw = [0u8; TOTP_SECRET_LEN];
    rand::rng().fill_bytes(&mut raw);
    base32::encode(base32::Alphabet::RFC4648 { padding: false }, &raw)
}

/// `otpauth://` provisioning URI for QR rendering on the client.
pub fn key_uri(secret: &str, account: &str, issuer: &str) -> Result<String> {
    Ok(build_totp(secret, account, issuer)?.get_url())
}

/// Time-window tolerant check: the skew setting accepts the neighbouring
/// step on either side.
pub fn verify_totp(code: &str, secret: &str, account: &str, issuer: &str) -> Result<bool> {
    let totp = build_totp(secret, account, issuer)?;
    totp.check_current(code).map_err(|e| {
        tracing::error!(error = %e, "system clock unavailable for TOTP check");
        AuthError::Unavailable
    })
}

fn build_totp(secret: &str, account: &str, issuer: &str) -> Result<TOTP> {
    let secret_bytes = Secret::Encoded(secret.to_string()).to_bytes().map_err(|e| {
        tracing::error!(error = ?e, "stored TOTP secret is not valid base32");
        AuthError::Unavailable
    })?;

    TOTP::new(
        Algorithm::SHA1,
        TOTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| {
        tracing::error!(error = ?e, "failed to construct TOTP instance");
        AuthError::Unavailable
    })
}
