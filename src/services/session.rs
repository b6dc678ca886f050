use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::Json;

use crate::modules::auth::crud::ConfirmationStore;
use crate::modules::auth::interface::{AuthError, Result};
use crate::modules::auth::model::User;
use crate::modules::auth::schema::ErrorResponse;
use crate::services::jwt::JwtService;
use crate::AppState;

pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Final gate of every login path. For two-factor accounts the confirmation
/// marker is the proof the second step happened; it is consumed here, exactly
/// once, before any token is minted.
pub struct SessionService {
    jwt: JwtService,
    confirmations: ConfirmationStore,
}

impl SessionService {
    pub fn new(jwt: JwtService, confirmations: ConfirmationStore) -> Self {
        Self { jwt, confirmations }
    }

    pub async fn establish(&self, user: &User) -> Result<SessionTokens> {
        if user.two_factor_enabled && !self.confirmations.consume(&user.id).await? {
            return Err(AuthError::TwoFactorRequired);
        }

        let access_token = self
            .jwt
            .create_access_token(&user.id, &user.email, &user.username)
            .map_err(internal)?;
        let refresh_token = self.jwt.create_refresh_token(&user.id).map_err(internal)?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_duration_secs(),
        })
    }
}

fn internal(err: jsonwebtoken::errors::Error) -> AuthError {
    tracing::error!(error = %err, "token signing failed");
    AuthError::Unavailable
}

/// Authenticated caller, extracted from the bearer token on protected routes.
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        let data = state
            .jwt_service
            .verify_access_token(token)
            .map_err(|_| unauthorized())?;

        Ok(CurrentUser {
            id: data.claims.sub,
            email: data.claims.email,
            username: data.claims.username,
        })
    }
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Authentication required")),
    )
}
