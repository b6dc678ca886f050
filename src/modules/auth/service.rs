use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use validator::Validate;

use crate::config::AuthConfig;
use crate::modules::auth::crud::{
    ConfirmationStore, NewUser, ResetTokenStore, TwoFactorTokenStore, UserStore,
};
use crate::modules::auth::interface::{AuthError, Result};
use crate::modules::auth::lockout::{LockoutDecision, LockoutPolicy};
use crate::modules::auth::model::User;
use crate::modules::auth::schema::{LoginRequest, ResetPasswordRequest, SignupRequest};
use crate::modules::auth::two_factor::{EnrollmentChallenge, TwoFactorEngine};
use crate::services::hashing;
use crate::services::mailer::Mailer;
use crate::services::session::{SessionService, SessionTokens};
use crate::AppState;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]{1,28}[a-zA-Z0-9]$").unwrap();
}

/// Where a login attempt ended up. `TwoFactorRequired` is flow control, not
/// failure: the password was right, the session is withheld.
pub enum LoginOutcome {
    Authenticated(SessionTokens),
    TwoFactorRequired,
}

/// The login/signup/reset orchestrator. Owns no state of its own; every
/// mutation goes through the stores so concurrent requests for the same user
/// contend on the database row, not on this struct.
pub struct AuthFlow {
    users: UserStore,
    reset_tokens: ResetTokenStore,
    confirmations: ConfirmationStore,
    engine: TwoFactorEngine,
    sessions: SessionService,
    mailer: Arc<dyn Mailer>,
    policy: LockoutPolicy,
    config: AuthConfig,
}

impl AuthFlow {
    pub fn new(state: &AppState) -> Self {
        let config = state.auth_config.clone();
        Self {
            users: UserStore::new(state.db.clone()),
            reset_tokens: ResetTokenStore::new(state.db.clone()),
            confirmations: ConfirmationStore::new(state.db.clone()),
            engine: TwoFactorEngine::new(
                TwoFactorTokenStore::new(state.db.clone()),
                state.mailer.clone(),
                config.clone(),
            ),
            sessions: SessionService::new(
                state.jwt_service.clone(),
                ConfirmationStore::new(state.db.clone()),
            ),
            mailer: state.mailer.clone(),
            policy: LockoutPolicy::new(&config),
            config,
        }
    }

    // =========================================================================
    // SIGNUP
    // =========================================================================

    pub async fn signup(&self, request: &SignupRequest) -> Result<(User, SessionTokens)> {
        request.validate().map_err(invalid)?;
        if !USERNAME_RE.is_match(&request.username) {
            return Err(AuthError::InvalidInput(
                "Username may only contain letters, digits, dots, underscores and hyphens"
                    .to_string(),
            ));
        }

        if self.users.find_by_email(&request.email).await.is_some()
            || self.users.find_by_username(&request.username).await.is_some()
        {
            return Err(AuthError::Conflict);
        }

        let password_hash = hashing::hash_password(&request.password).map_err(hashing_fault)?;
        let user = self
            .users
            .create(NewUser {
                email: &request.email,
                username: &request.username,
                password_hash,
            })
            .await?;

        self.mailer
            .send_welcome_email(&user.email, &user.username)
            .await;

        // Fresh accounts have no second factor, so this mints tokens directly.
        let tokens = self.sessions.establish(&user).await?;
        Ok((user, tokens))
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        match request {
            LoginRequest::Password { email, password } => {
                self.password_login(email, password).await
            }
            LoginRequest::SecondFactor { email, code } => {
                self.second_factor_login(email, code).await
            }
        }
    }

    /// First step. Ordering is load-bearing: lockout before password check,
    /// password check before any hint that a second factor exists.
    async fn password_login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        if !email.contains('@') || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        // Unknown account and passwordless account produce the exact same
        // error as a wrong password.
        let user = self
            .users
            .find_by_email(email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;
        if user.password_hash.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        if let LockoutDecision::Locked { until } = self.policy.check(user.locked_until, now) {
            return Err(AuthError::AccountLocked { until });
        }

        let matches = hashing::verify_password(password, &user.password_hash)
            .map_err(hashing_fault)?;
        if !matches {
            return Err(self.register_failure(&user).await?);
        }

        if user.failed_login_attempts > 0 || user.locked_until.is_some() {
            self.users.clear_login_failures(&user.id).await?;
        }

        if !user.two_factor_enabled {
            let tokens = self.sessions.establish(&user).await?;
            return Ok(LoginOutcome::Authenticated(tokens));
        }

        self.engine.issue_challenge(&user).await?;
        Ok(LoginOutcome::TwoFactorRequired)
    }

    /// Second step: the caller already proved the password and now presents
    /// a code. Wrong codes do not count toward lockout.
    async fn second_factor_login(&self, email: &str, code: &str) -> Result<LoginOutcome> {
        if !email.contains('@') || code.is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and code are required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;
        // A code for an account without a second factor is as good as a bad
        // password; answer in the same shape.
        if !user.two_factor_enabled {
            return Err(AuthError::InvalidCredentials);
        }

        if let LockoutDecision::Locked { until } = self.policy.check(user.locked_until, Utc::now())
        {
            return Err(AuthError::AccountLocked { until });
        }

        self.engine.verify(&user, code).await?;

        // The marker is the trust anchor for establishment; it is consumed
        // exactly once inside the session service.
        self.confirmations.create(&user.id).await?;
        let tokens = self.sessions.establish(&user).await?;
        Ok(LoginOutcome::Authenticated(tokens))
    }

    /// Lockout failure branch: count atomically, lock at the threshold. The
    /// attempt that trips the lock already reports it.
    async fn register_failure(&self, user: &User) -> Result<AuthError> {
        let attempts = self.users.record_login_failure(&user.id).await?;
        if let Some(until) = self.policy.after_failure(attempts, Utc::now()) {
            self.users.lock_until(&user.id, until).await?;
            return Ok(AuthError::AccountLocked { until });
        }
        Ok(AuthError::InvalidCredentials)
    }

    // =========================================================================
    // PASSWORD RESET
    // =========================================================================

    /// Issues a reset token when the account exists. Callers answer with the
    /// same generic message either way.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        if let Some(user) = self.users.find_by_email(email).await {
            let token = self
                .reset_tokens
                .create(&user.id, self.config.reset_token_ttl)
                .await?;
            self.mailer
                .send_password_reset_email(&user.email, &token.token)
                .await;
        }
        Ok(())
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<()> {
        request.validate().map_err(invalid)?;
        if request.password != request.password_confirm {
            return Err(AuthError::InvalidInput("Passwords don't match".to_string()));
        }

        let token = self
            .reset_tokens
            .find_by_token(&request.token)
            .await
            .ok_or(AuthError::InvalidToken)?;
        if token.used {
            return Err(AuthError::InvalidToken);
        }
        if Utc::now() > token.expires_at {
            return Err(AuthError::TokenExpired);
        }

        // Claim before mutating anything: of two concurrent redemptions only
        // the one whose delete lands gets to change the password.
        if !self.reset_tokens.claim(&token.id).await? {
            return Err(AuthError::InvalidToken);
        }

        let password_hash = hashing::hash_password(&request.password).map_err(hashing_fault)?;
        self.users
            .update_password(&token.user_id, &password_hash)
            .await?;
        Ok(())
    }

    // =========================================================================
    // TWO-FACTOR ENROLLMENT
    // =========================================================================

    pub async fn begin_two_factor_enrollment(&self, user_id: &str) -> Result<EnrollmentChallenge> {
        let user = self.current_user(user_id).await?;
        if user.two_factor_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let challenge = self.engine.begin_enrollment(&user).await?;
        // The pending TOTP secret lives on the user row until a correct code
        // confirms it; enabled stays false.
        if let EnrollmentChallenge::Totp { secret, .. } = &challenge {
            self.users
                .set_two_factor(&user.id, false, Some(secret.as_str()))
                .await?;
        }
        Ok(challenge)
    }

    pub async fn activate_two_factor(&self, user_id: &str, code: &str) -> Result<()> {
        let user = self.current_user(user_id).await?;
        if user.two_factor_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        self.engine.verify(&user, code).await?;
        self.users
            .set_two_factor(&user.id, true, user.two_factor_secret.as_deref())
            .await?;
        Ok(())
    }

    pub async fn disable_two_factor(&self, user_id: &str, code: &str) -> Result<()> {
        let user = self.current_user(user_id).await?;
        if !user.two_factor_enabled {
            return Err(AuthError::TwoFactorNotEnabled);
        }

        self.engine.verify(&user, code).await?;
        self.users.set_two_factor(&user.id, false, None).await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::InvalidCredentials)
    }
}

fn invalid(errors: validator::ValidationErrors) -> AuthError {
    AuthError::InvalidInput(errors.to_string())
}

fn hashing_fault(err: argon2::password_hash::Error) -> AuthError {
    tracing::error!(error = %err, "password hashing failed");
    AuthError::Unavailable
}
