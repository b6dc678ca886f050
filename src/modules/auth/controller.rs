use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    interface::AuthError,
    schema::{
        ErrorResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
        LoginRequires2faResponse, LoginResponse, ResetPasswordRequest, ResetPasswordResponse,
        SignupRequest, SignupResponse, TwoFactorCodeRequest, TwoFactorSetupResponse,
        TwoFactorStatusResponse, UserResponse,
    },
    service::{AuthFlow, LoginOutcome},
    two_factor::EnrollmentChallenge,
};
use crate::services::session::CurrentUser;
use crate::AppState;

const RESET_REQUESTED_MESSAGE: &str =
    "If an account with this email exists, a reset link has been sent.";

fn reply_error(err: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    (err.status_code(), Json(ErrorResponse::new(err.to_string())))
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), (StatusCode, Json<ErrorResponse>)> {
    let flow = AuthFlow::new(&state);
    let (user, tokens) = flow.signup(&req).await.map_err(reply_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: UserResponse::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer",
            expires_in: tokens.expires_in,
        }),
    ))
}

pub async fn login(State(state): State<Arc<AppState>>, Json(req): Json<LoginRequest>) -> Response {
    let flow = AuthFlow::new(&state);
    match flow.login(&req).await {
        Ok(LoginOutcome::Authenticated(tokens)) => (
            StatusCode::OK,
            Json(LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                token_type: "Bearer",
                expires_in: tokens.expires_in,
            }),
        )
            .into_response(),
        Ok(LoginOutcome::TwoFactorRequired) => (
            StatusCode::OK,
            Json(LoginRequires2faResponse {
                requires_2fa: true,
                message: "Enter the one-time code to finish signing in",
            }),
        )
            .into_response(),
        Err(err) => reply_error(err).into_response(),
    }
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<(StatusCode, Json<UserResponse>), (StatusCode, Json<ErrorResponse>)> {
    let flow = AuthFlow::new(&state);
    let user = flow.current_user(&current.id).await.map_err(reply_error)?;
    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<ForgotPasswordResponse>), (StatusCode, Json<ErrorResponse>)> {
    if req.validate().is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid email format")),
        ));
    }

    let flow = AuthFlow::new(&state);
    flow.request_password_reset(&req.email)
        .await
        .map_err(reply_error)?;

    // One response shape whether or not the account exists.
    Ok((
        StatusCode::OK,
        Json(ForgotPasswordResponse {
            message: RESET_REQUESTED_MESSAGE,
        }),
    ))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<ResetPasswordResponse>), (StatusCode, Json<ErrorResponse>)> {
    let flow = AuthFlow::new(&state);
    flow.reset_password(&req).await.map_err(reply_error)?;

    Ok((
        StatusCode::OK,
        Json(ResetPasswordResponse {
            message: "Password has been reset successfully.",
        }),
    ))
}

pub async fn setup_2fa(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<(StatusCode, Json<TwoFactorSetupResponse>), (StatusCode, Json<ErrorResponse>)> {
    let flow = AuthFlow::new(&state);
    let challenge = flow
        .begin_two_factor_enrollment(&current.id)
        .await
        .map_err(reply_error)?;

    let response = match challenge {
        EnrollmentChallenge::Totp {
            secret,
            otpauth_url,
        } => TwoFactorSetupResponse {
            secret: Some(secret),
            otpauth_url: Some(otpauth_url),
            message: "Scan the QR code, then confirm with a code from your authenticator app",
        },
        EnrollmentChallenge::CodeSent => TwoFactorSetupResponse {
            secret: None,
            otpauth_url: None,
            message: "A one-time code has been sent to your email",
        },
    };

    Ok((StatusCode::OK, Json(response)))
}

pub async fn activate_2fa(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<TwoFactorCodeRequest>,
) -> Result<(StatusCode, Json<TwoFactorStatusResponse>), (StatusCode, Json<ErrorResponse>)> {
    let flow = AuthFlow::new(&state);
    flow.activate_two_factor(&current.id, &req.code)
        .await
        .map_err(reply_error)?;

    Ok((
        StatusCode::OK,
        Json(TwoFactorStatusResponse {
            two_factor_enabled: true,
            message: "Two-factor authentication enabled",
        }),
    ))
}

pub async fn disable_2fa(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<TwoFactorCodeRequest>,
) -> Result<(StatusCode, Json<TwoFactorStatusResponse>), (StatusCode, Json<ErrorResponse>)> {
    let flow = AuthFlow::new(&state);
    flow.disable_two_factor(&current.id, &req.code)
        .await
        .map_err(reply_error)?;

    Ok((
        StatusCode::OK,
        Json(TwoFactorStatusResponse {
            two_factor_enabled: false,
            message: "Two-factor authentication disabled",
        }),
    ))
}
