use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::modules::advisor::schema::{FormReviewRequest, FormReviewResponse};
use crate::modules::auth::schema::ErrorResponse;
use crate::services::advisor::AdvisorError;
use crate::services::session::CurrentUser;
use crate::AppState;

pub async fn review_form(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Json(req): Json<FormReviewRequest>,
) -> Result<(StatusCode, Json<FormReviewResponse>), (StatusCode, Json<ErrorResponse>)> {
    if req.form_configuration.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("form_configuration is required")),
        ));
    }

    let suggestions = state
        .advisor
        .review_form(&req.form_configuration, req.user_context.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "form review request failed");
            match e {
                AdvisorError::NotConfigured => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse::new("Form review service is not configured")),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse::new("Form review service is unavailable")),
                ),
            }
        })?;

    Ok((StatusCode::OK, Json(FormReviewResponse { suggestions })))
}
