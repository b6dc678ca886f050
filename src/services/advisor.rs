use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for the external form-review service. One opaque request/response
/// call; no retry or backoff.
#[derive(Clone)]
pub struct AdvisorClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug)]
pub enum AdvisorError {
    NotConfigured,
    HttpError(String),
    ApiError(String),
    ParseError(String),
}

impl std::fmt::Display for AdvisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvisorError::NotConfigured => write!(f, "Form review service is not configured"),
            AdvisorError::HttpError(e) => write!(f, "HTTP error: {}", e),
            AdvisorError::ApiError(e) => write!(f, "API error: {}", e),
            AdvisorError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for AdvisorError {}

#[derive(Serialize)]
struct ReviewRequest<'a> {
    form_configuration: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_context: Option<&'a str>,
}

#[derive(Deserialize)]
struct ReviewResponse {
    suggestions: String,
}

impl AdvisorClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Ask the service to review a form configuration (a JSON document, but
    /// treated as an opaque string end to end).
    pub async fn review_form(
        &self,
        form_configuration: &str,
        user_context: Option<&str>,
    ) -> Result<String, AdvisorError> {
        let base_url = self.base_url.as_ref().ok_or(AdvisorError::NotConfigured)?;
        let url = format!("{}/v1/form-review", base_url);

        let mut request = self.client.post(&url).json(&ReviewRequest {
            form_configuration,
            user_context,
        });
        if let Some(key) = &self.api_key {
            request = request.header("API-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdvisorError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdvisorError::ApiError(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let review: ReviewResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::ParseError(e.to_string()))?;

        Ok(review.suggestions)
    }
}
