use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(controller::signup))
        .route("/login", post(controller::login))
        .route("/me", get(controller::me))
        .route("/forgot-password", post(controller::forgot_password))
        .route("/reset-password", post(controller::reset_password))
        .route("/2fa/setup", post(controller::setup_2fa))
        .route("/2fa/activate", post(controller::activate_2fa))
        .route("/2fa/disable", post(controller::disable_2fa))
}
