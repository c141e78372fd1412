use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{DomainError, GenerationErrorKind};

/// Wraps a [`DomainError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::UnsupportedFileKind(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DomainError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::EmptyIndex
            | DomainError::NoIndexLoaded
            | DomainError::IndexNotFound(_)
            | DomainError::EmbeddingMismatch { .. } => StatusCode::CONFLICT,
            DomainError::IndexCorrupt(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::GenerationUnavailable(GenerationErrorKind::RateLimit) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            DomainError::GenerationUnavailable(GenerationErrorKind::Network)
            | DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DomainError::GenerationUnavailable(_) | DomainError::Embedding(_) => {
                StatusCode::BAD_GATEWAY
            }
            DomainError::InvalidConfiguration(_) | DomainError::Io(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            DomainError::Validation(_) => "validation",
            DomainError::UnsupportedFileKind(_) => "unsupported_file_kind",
            DomainError::Extraction(_) => "extraction_failed",
            DomainError::EmptyIndex | DomainError::NoIndexLoaded | DomainError::IndexNotFound(_) => {
                "no_index_loaded"
            }
            DomainError::EmbeddingMismatch { .. } => "embedding_mismatch",
            DomainError::IndexCorrupt(_) => "index_corrupt",
            DomainError::GenerationUnavailable(_) => "generation_unavailable",
            DomainError::Embedding(_) => "embedding_unavailable",
            DomainError::Timeout(_) => "timeout",
            DomainError::InvalidConfiguration(_) | DomainError::Io(_) | DomainError::Internal(_) => {
                "internal"
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(DomainError::NoIndexLoaded).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(DomainError::GenerationUnavailable(GenerationErrorKind::RateLimit)).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError(DomainError::GenerationUnavailable(GenerationErrorKind::Auth)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(DomainError::UnsupportedFileKind(".docx".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_response_carries_user_message() {
        let response = ApiError(DomainError::validation("Please enter a question.")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
