use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request itself is unusable (missing field, malformed body, bad bounds).
    #[error("{0}")]
    ValidationError(String),

    #[error("Summarization backend error: {0}")]
    BackendError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("Lexicon error: {0}")]
    LexiconError(String),

    #[error("News search error: {0}")]
    NewsError(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ServiceError {
    /// Builds the fixed validation error reported when a required JSON field is absent.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        ServiceError::ValidationError(format!("Missing '{field}' field in JSON data."))
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, ServiceError::ValidationError(_))
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::BackendError(_)
            | ServiceError::HttpError(_)
            | ServiceError::TokenizerError(_)
            | ServiceError::LexiconError(_)
            | ServiceError::NewsError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if !self.is_validation() {
            tracing::error!(error = %self, "Request failed");
        }
        crate::api::helpers::err_response(self.status_code(), &self.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        ServiceError::HttpError(error.to_string())
    }
}

impl From<tokenizers::Error> for ServiceError {
    fn from(error: tokenizers::Error) -> Self {
        ServiceError::TokenizerError(error.to_string())
    }
}
