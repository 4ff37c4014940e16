pub mod transcripts;
pub mod video;

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use lectern_services::transcripts::TranscriptFile;

use crate::error::ApiError;

/// `attachment` disposition; non-ASCII names use the RFC 5987 `filename*` form.
pub fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() && !filename.contains(['"', '\\']) {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    }
}

pub fn file_response(file: TranscriptFile) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.content_type)
        .header(header::CONTENT_LANGUAGE, file.language.as_str());
    if file.attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            content_disposition(&file.filename),
        );
    }
    builder
        .body(Body::from(file.content))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")))
}
