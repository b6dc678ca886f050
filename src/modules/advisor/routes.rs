use axum::{routing::post, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn advisor_routes() -> Router<Arc<AppState>> {
    Router::new().route("/form-review", post(controller::review_form))
}
