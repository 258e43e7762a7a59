use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("unknown user role: {0}")]
    InvalidRole(String),
    #[error("updated response must not be empty")]
    EmptyCorrection,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("entry already indexed: {0}")]
    DuplicateId(String),
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RagError::InvalidRole(_) | RagError::EmptyCorrection => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RagError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RagError::DuplicateId(_) => StatusCode::CONFLICT,
            RagError::EmbeddingUnavailable(_) | RagError::GenerationUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RagError::DimensionMismatch { .. } | RagError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
