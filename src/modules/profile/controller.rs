use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::crud::UserStore;
use crate::modules::auth::schema::{ErrorResponse, UserResponse};
use crate::modules::profile::schema::UpdateProfileRequest;
use crate::services::session::CurrentUser;
use crate::AppState;

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<(StatusCode, Json<UserResponse>), (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let users = UserStore::new(state.db.clone());

    let user = users.find_by_id(&current.id).await.ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Authentication required")),
    ))?;

    // Uniqueness clashes surface as Conflict through the store.
    users
        .update_profile(&user.id, &req.username, &req.email)
        .await
        .map_err(|e| (e.status_code(), Json(ErrorResponse::new(e.to_string()))))?;

    let updated = users.find_by_id(&user.id).await.ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("Service temporarily unavailable")),
    ))?;

    Ok((StatusCode::OK, Json(UserResponse::from(updated))))
}
