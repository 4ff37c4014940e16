//! Learner-facing transcript endpoints. These are public.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use lectern_services::transcripts::{TranscriptFormat, TranslationOutcome};
use serde::Deserialize;

use super::file_response;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TranslationQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub lang: Option<String>,
    pub format: Option<String>,
}

fn outcome_response(outcome: TranslationOutcome) -> Result<Response, ApiError> {
    match outcome {
        TranslationOutcome::Transcript(file) => file_response(file),
        TranslationOutcome::Redirect(location) => {
            Ok(Redirect::temporary(&location).into_response())
        }
    }
}

/// `GET /api/video/{locator}/transcript/translation` without a language.
pub async fn translation_without_language(
    State(state): State<AppState>,
    Path(locator): Path<String>,
    Query(query): Query<TranslationQuery>,
) -> Result<Response, ApiError> {
    let outcome = state
        .transcripts
        .translation(
            &locator,
            None,
            query.video_id.as_deref(),
            query.filename.as_deref(),
        )
        .await?;
    outcome_response(outcome)
}

pub async fn translation(
    State(state): State<AppState>,
    Path((locator, lang)): Path<(String, String)>,
    Query(query): Query<TranslationQuery>,
) -> Result<Response, ApiError> {
    let outcome = state
        .transcripts
        .translation(
            &locator,
            Some(&lang),
            query.video_id.as_deref(),
            query.filename.as_deref(),
        )
        .await?;
    outcome_response(outcome)
}

pub async fn available_translations(
    State(state): State<AppState>,
    Path(locator): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let langs = state.transcripts.available_translations(&locator).await?;
    if langs.is_empty() {
        return Err(ApiError::NotFound(
            "No transcripts available for this video".to_string(),
        ));
    }
    Ok(Json(langs))
}

/// `GET /api/video/{locator}/transcript/download?lang=&format=srt|txt`
pub async fn download(
    State(state): State<AppState>,
    Path(locator): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        None | Some("") => TranscriptFormat::Srt,
        Some(raw) => TranscriptFormat::from_extension(raw)
            .map_err(|_| ApiError::BadRequest(format!("Invalid transcript format `{raw}`")))?,
    };
    let file = state
        .transcripts
        .learner_download(&locator, query.lang.as_deref(), format)
        .await?;
    file_response(file)
}
