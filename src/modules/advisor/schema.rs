use serde::{Deserialize, Serialize};

/// The configuration is a JSON document, but it travels as an opaque string:
/// this service never interprets it.
#[derive(Debug, Deserialize)]
pub struct FormReviewRequest {
    pub form_configuration: String,
    #[serde(default)]
    pub user_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormReviewResponse {
    pub suggestions: String,
}
