use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every error reaches the client as a JSON `error` field; none are swallowed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("File exceeds the {0} MB upload limit")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::PayloadTooLarge(limit_mb) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File exceeds the {limit_mb} MB upload limit"),
            ),
            // Unreadable and empty documents keep their distinct messages so
            // the UI can suggest a text-based export.
            AppError::Extraction(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Llm(e) => {
                tracing::error!("critique service failed: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI service unavailable. Please try again later.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_with_message() {
        let (status, body) = body_json(AppError::Validation("No file uploaded".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_payload_too_large_maps_to_413() {
        let (status, body) = body_json(AppError::PayloadTooLarge(5)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].as_str().unwrap().contains("5 MB"));
    }

    #[tokio::test]
    async fn test_empty_extraction_is_a_distinct_client_error() {
        let (status, body) = body_json(AppError::Extraction(ExtractError::Empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("scanned"));
    }

    #[tokio::test]
    async fn test_llm_exhaustion_maps_to_single_503() {
        let error = AppError::Llm(LlmError::Exhausted {
            models: "a, b".into(),
            last_error: "connect refused".into(),
        });
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "AI service unavailable. Please try again later.");
        // Exactly one field: the error message, no partial result alongside.
        assert_eq!(body.as_object().unwrap().len(), 1);
    }
}
