use std::sync::Arc;

use authflow::config::{environment::Config, init_db};
use authflow::services::advisor::AdvisorClient;
use authflow::services::jwt::JwtService;
use authflow::services::mailer::{LogMailer, Mailer, ResendMailer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url).await;
    tracing::info!("Connected to SQLite");

    let jwt_service = JwtService::new(config.jwt_secret);

    let mailer: Arc<dyn Mailer> = match config.resend_api_key {
        Some(api_key) => Arc::new(ResendMailer::new(
            api_key,
            config.email_from,
            config.app_url,
        )),
        None => {
            tracing::warn!("RESEND_API_KEY not set; outbound email disabled");
            Arc::new(LogMailer)
        }
    };

    let advisor = AdvisorClient::new(config.advisor_api_url, config.advisor_api_key);

    let app = authflow::create_app(db, jwt_service, mailer, advisor, config.auth).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
