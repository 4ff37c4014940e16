use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lectern_services::auth::AuthError;
use lectern_services::transcripts::TranscriptError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorResponse {
            status: "Error",
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<TranscriptError> for ApiError {
    fn from(err: TranscriptError) -> Self {
        match err {
            TranscriptError::Validation(msg) => ApiError::BadRequest(msg),
            TranscriptError::NotFound(msg) => ApiError::NotFound(msg),
            TranscriptError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            e @ (TranscriptError::Codec(_) | TranscriptError::ExternalFetch(_)) => {
                ApiError::BadRequest(e.to_string())
            }
            TranscriptError::Store(e) => {
                error!(error = %e, "Transcript storage failure");
                ApiError::Internal("Internal storage error".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}
