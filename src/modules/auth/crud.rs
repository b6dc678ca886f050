use chrono::{DateTime, Duration, Utc};
use rand::{Rng, RngCore};
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::auth::interface::Result;
use crate::modules::auth::model::{PasswordResetToken, TwoFactorToken, User};

/// Persistence for user records. Lookups swallow backend faults into `None`
/// (after logging), so callers branch only on presence; mutations surface
/// `Unavailable`/`Conflict` through the error taxonomy.
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: String,
}

impl UserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "user lookup by email failed");
                None
            })
    }

    pub async fn find_by_id(&self, id: &str) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "user lookup by id failed");
                None
            })
    }

    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "user lookup by username failed");
                None
            })
    }

    /// Accounts are born email-verified: this design has no verification step.
    pub async fn create(&self, new_user: NewUser<'_>) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new_user.email.to_string(),
            username: new_user.username.to_string(),
            password_hash: new_user.password_hash,
            email_verified: true,
            failed_login_attempts: 0,
            locked_until: None,
            two_factor_enabled: false,
            two_factor_secret: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, email_verified,
                               failed_login_attempts, locked_until, two_factor_enabled,
                               two_factor_secret, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.email_verified)
        .bind(user.failed_login_attempts)
        .bind(user.locked_until)
        .bind(user.two_factor_enabled)
        .bind(&user.two_factor_secret)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_profile(&self, id: &str, username: &str, email: &str) -> Result<()> {
        sqlx::query("UPDATE users SET username = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(username)
            .bind(email)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A fresh password also clears any lockout left on the account.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, failed_login_attempts = 0, locked_until = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_two_factor(
        &self,
        id: &str,
        enabled: bool,
        secret: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET two_factor_enabled = ?, two_factor_secret = ?, updated_at = ? WHERE id = ?",
        )
        .bind(enabled)
        .bind(secret)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Atomic in-store increment; concurrent failures cannot under-count.
    /// Returns the counter value after this failure.
    pub async fn record_login_failure(&self, id: &str) -> Result<i64> {
        let attempts: i64 = sqlx::query_scalar(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1, updated_at = ?
            WHERE id = ?
            RETURNING failed_login_attempts
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(attempts)
    }

    pub async fn lock_until(&self, id: &str, until: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET locked_until = ?, updated_at = ? WHERE id = ?")
            .bind(until)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear_login_failures(&self, id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Single-use password-reset tokens.
#[derive(Clone)]
pub struct ResetTokenStore {
    pool: DbPool,
}

impl ResetTokenStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Mints an unguessable token (32 bytes from the thread CSPRNG, hex).
    pub async fn create(&self, user_id: &str, ttl: Duration) -> Result<PasswordResetToken> {
        let mut raw = [0u8; 32];
        rand::rng().fill_bytes(&mut raw);

        let now = Utc::now();
        let token = PasswordResetToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token: hex::encode(raw),
            expires_at: now + ttl,
            used: false,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    pub async fn find_by_token(&self, token: &str) -> Option<PasswordResetToken> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "reset token lookup failed");
            None
        })
    }

    /// Conditionally deletes the row; exactly one concurrent caller wins.
    pub async fn claim(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE id = ? AND used = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// Emailed one-time login codes. One live code per email address.
#[derive(Clone)]
pub struct TwoFactorTokenStore {
    pool: DbPool,
}

impl TwoFactorTokenStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Delete-then-create, never update-in-place: a stale row must not keep
    /// its old expiry under a fresh code.
    pub async fn issue(&self, email: &str, digits: u32, ttl: Duration) -> Result<TwoFactorToken> {
        sqlx::query("DELETE FROM two_factor_tokens WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;

        let lower = 10u32.pow(digits - 1);
        let upper = 10u32.pow(digits);
        let code = rand::rng().random_range(lower..upper).to_string();

        let now = Utc::now();
        let token = TwoFactorToken {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            code,
            expires_at: now + ttl,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO two_factor_tokens (id, email, code, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.email)
        .bind(&token.code)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<TwoFactorToken> {
        sqlx::query_as::<_, TwoFactorToken>("SELECT * FROM two_factor_tokens WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "two-factor token lookup failed");
                None
            })
    }

    /// Single-use redemption: the delete must match both row and code.
    pub async fn claim(&self, id: &str, code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM two_factor_tokens WHERE id = ? AND code = ?")
            .bind(id)
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM two_factor_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// One-shot second-factor confirmation markers, keyed by user.
#[derive(Clone)]
pub struct ConfirmationStore {
    pool: DbPool,
}

impl ConfirmationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO two_factor_confirmations (user_id, created_at)
            VALUES (?, ?)
            ON CONFLICT (user_id) DO UPDATE SET created_at = excluded.created_at
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consume the marker; true only for the caller whose delete landed.
    pub async fn consume(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM two_factor_confirmations WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
