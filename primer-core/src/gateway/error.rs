//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{AttentionError, ContentError, ScrollSpyError};

/// Error body returned by every failing API route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Failure of an API handler, mapped to a status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        let message = err.to_string();
        match err {
            ContentError::SectionNotFound { .. }
            | ContentError::QuestionNotFound { .. }
            | ContentError::UserNotFound { .. } => ApiError::NotFound(message),
            ContentError::UnknownOption { .. } | ContentError::InvalidProgress { .. } => {
                ApiError::BadRequest(message)
            }
            ContentError::UsernameTaken { .. } => ApiError::Conflict(message),
            ContentError::InvalidCredentials { .. } => ApiError::Unauthorized(message),
        }
    }
}

impl From<AttentionError> for ApiError {
    fn from(err: AttentionError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ScrollSpyError> for ApiError {
    fn from(err: ScrollSpyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}
