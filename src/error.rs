//! Error types for Storyguard.
//!
//! `ServiceError` covers calls to the external generation, classifier and
//! moderation services. `StoryGuardError` is the HTTP-facing error that maps
//! cleanly to responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::ErrorKind;

/// Failure of an external service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Response contained no choices")]
    EmptyResponse,

    #[error("Moderation score is not an integer in 1..=5: {0:?}")]
    MalformedScore(String),

    #[error("Classifier reply is not a verdict: {0:?}")]
    MalformedVerdict(String),

    #[error("Call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Call cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Coarse kind carried into `Outcome::Failed`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Request(_) | ServiceError::Api { .. } | ServiceError::EmptyResponse => {
                ErrorKind::Service
            }
            ServiceError::MalformedScore(_) => ErrorKind::MalformedScore,
            ServiceError::MalformedVerdict(_) => ErrorKind::MalformedVerdict,
            ServiceError::Timeout(_) => ErrorKind::Timeout,
            ServiceError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Request(e.to_string())
    }
}

/// Unified error type for Storyguard HTTP operations.
#[derive(Debug, Error)]
pub enum StoryGuardError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for StoryGuardError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            StoryGuardError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            StoryGuardError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "Configuration error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for Storyguard HTTP operations.
pub type StoryGuardResult<T> = Result<T, StoryGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_kinds() {
        assert_eq!(
            ServiceError::Api {
                status: 429,
                body: "slow down".into()
            }
            .kind(),
            ErrorKind::Service
        );
        assert_eq!(
            ServiceError::Timeout(std::time::Duration::from_secs(1)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(ServiceError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_bad_request_status() {
        let response = StoryGuardError::BadRequest("empty prompt".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_config_error_hides_details() {
        let response = StoryGuardError::Config("missing api key".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
