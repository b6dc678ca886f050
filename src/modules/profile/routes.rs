use axum::{routing::put, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn profile_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", put(controller::update_profile))
}
