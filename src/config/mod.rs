pub mod auth_config;
pub mod database;
pub mod environment;

pub use auth_config::{AuthConfig, TwoFactorMode};
pub use database::{init_db, DbPool};
