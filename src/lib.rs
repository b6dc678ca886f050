pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{AuthConfig, DbPool};
use modules::advisor::advisor_routes;
use modules::auth::auth_routes;
use modules::profile::profile_routes;
use services::advisor::AdvisorClient;
use services::jwt::JwtService;
use services::mailer::Mailer;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub mailer: Arc<dyn Mailer>,
    pub advisor: AdvisorClient,
    pub auth_config: AuthConfig,
}

pub async fn create_app(
    db: DbPool,
    jwt_service: JwtService,
    mailer: Arc<dyn Mailer>,
    advisor: AdvisorClient,
    auth_config: AuthConfig,
) -> Router {
    let state = Arc::new(AppState {
        db,
        jwt_service,
        mailer,
        advisor,
        auth_config,
    });

    // Burst of 100, then 1 per second: generous for humans, a wall for
    // credential stuffing.
    let rate_limiter = create_rate_limiter(100);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/profile", profile_routes())
        .nest("/ai", advisor_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "AuthFlow API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
