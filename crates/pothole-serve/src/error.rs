//! API error types and response formatting.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The reading could not be durably recorded.
    #[error("storage error: {0}")]
    Storage(#[source] pothole_ingest::Error),

    /// The pipeline has stopped accepting readings.
    #[error("service unavailable")]
    Unavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<pothole_ingest::Error> for ApiError {
    fn from(err: pothole_ingest::Error) -> Self {
        match err {
            err if err.is_storage_failure() => Self::Storage(err),
            pothole_ingest::Error::PipelineClosed => Self::Unavailable,
            err => Self::Internal(err.into()),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    ok: bool,
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            Self::Storage(err) => {
                tracing::error!(error = %err, "reading not stored");
                (StatusCode::SERVICE_UNAVAILABLE, "storage_error", None)
            }
            Self::Unavailable => {
                tracing::warn!("request rejected, pipeline closed");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some("An internal error occurred".to_string()),
                )
            }
        };

        let body = ErrorResponse {
            ok: false,
            error,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn storage_failures_are_503_without_detail() {
        let err = ApiError::from(pothole_ingest::Error::Storage("disk full".into()));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({"ok": false, "error": "storage_error"}));
    }

    #[tokio::test]
    async fn closed_pipeline_is_unavailable() {
        let err = ApiError::from(pothole_ingest::Error::PipelineClosed);
        assert!(matches!(err, ApiError::Unavailable));
        let (status, _) = body_json(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn bad_request_carries_message() {
        let (status, body) = body_json(ApiError::BadRequest("after must be >= 0".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "after must be >= 0");
    }

    #[test]
    fn storage_variants_map_to_storage() {
        let io = pothole_ingest::Error::Io(std::io::Error::other("read-only fs"));
        assert!(matches!(ApiError::from(io), ApiError::Storage(_)));
    }
}
