use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::rag::RagError;

/// Message returned for every failure whose details stay in the logs.
pub const GENERIC_SERVER_ERROR: &str = "Server error.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::Internal(GENERIC_SERVER_ERROR.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderError;

    #[test]
    fn invalid_input_keeps_its_message() {
        let err: ApiError = RagError::InvalidInput("Question is required.".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "Question is required."));
    }

    #[test]
    fn provider_failures_are_opaque() {
        let err: ApiError = RagError::Provider(ProviderError::Status {
            status: 401,
            body: "API key not valid".to_string(),
        })
        .into();
        assert!(matches!(err, ApiError::Internal(ref msg) if msg == GENERIC_SERVER_ERROR));
    }

    #[test]
    fn maps_variants_to_status_codes() {
        let bad = ApiError::BadRequest("x".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let missing = ApiError::NotFound("x".into()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let internal = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
