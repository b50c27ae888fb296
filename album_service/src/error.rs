//! Error types for the record store, the chat proxy and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record failed validation before reaching the backend.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No record exists for the given id.
    #[error("album not found: {0}")]
    NotFound(String),

    /// The backend failed to read, write or decode a record.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the upstream chat-completion call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request could not be built, sent, or its body read.
    #[error("error sending request to chat upstream: {0}")]
    UpstreamRequest(String),

    /// The upstream answered with a non-success status.
    #[error("received non-success response: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The upstream body did not match the completion response shape.
    #[error("error decoding chat response: {0}")]
    Decode(String),

    /// The upstream returned zero choices.
    #[error("no response from chat upstream")]
    EmptyResponse,
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be parsed.
    #[error("Invalid input")]
    InvalidInput,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput | ApiError::Store(StoreError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Backend(_)) | ApiError::Chat(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Store(StoreError::NotFound(_)) => json!({ "message": "album not found" }),
            ApiError::Store(StoreError::InvalidInput(reason)) => json!({ "error": reason }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(StoreError::InvalidInput("id".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::NotFound("1".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StoreError::Backend("io".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ChatError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_status_message_carries_body() {
        let err = ChatError::UpstreamStatus {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "received non-success response: 429 - slow down");
    }
}
