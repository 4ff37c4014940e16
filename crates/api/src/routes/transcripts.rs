//! Authoring endpoints. Every handler requires a token granting the block's course.

use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    response::Response,
};
use lectern_db::models::VideoBlockPatch;
use lectern_services::transcripts::{
    PresenceRecord, TranscriptFormat, VideoSource, service::TranscriptUpload,
};
use serde::{Deserialize, Serialize};

use super::file_response;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct SubsResponse {
    pub status: &'static str,
    pub subs: String,
}

impl SubsResponse {
    fn success(subs: String) -> Json<Self> {
        Json(Self {
            status: "Success",
            subs,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub record: PresenceRecord,
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub locator: String,
    #[serde(default)]
    pub videos: Vec<VideoSource>,
}

#[derive(Debug, Deserialize)]
pub struct ChooseRequest {
    #[serde(default)]
    pub locator: String,
    #[serde(default)]
    pub html5_id: String,
    #[serde(default)]
    pub videos: Vec<VideoSource>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub locator: String,
    #[serde(default)]
    pub metadata: VideoBlockPatch,
    #[serde(default)]
    pub current_subs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub locator: String,
    pub subs_id: Option<String>,
    pub format: Option<String>,
}

fn empty_video_data() -> ApiError {
    ApiError::BadRequest("Incoming video data is empty.".to_string())
}

/// `GET /api/transcripts/check?data=<json>`
pub async fn check(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, ApiError> {
    let data = query.data.ok_or_else(empty_video_data)?;
    let request: VideoRequest = serde_json::from_str(&data).map_err(|_| empty_video_data())?;

    let record = state
        .transcripts
        .check(&auth.claims, &request.locator, &request.videos)
        .await?;

    Ok(Json(CheckResponse {
        status: "Success",
        record,
    }))
}

/// Multipart fields: `locator`, `video_list` (JSON), `transcript-file`, optional `language`.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<SubsResponse>, ApiError> {
    let mut locator = String::new();
    let mut language = None;
    let mut video_list: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        let read_text =
            |e: MultipartError| ApiError::BadRequest(format!("Failed to read field: {e}"));

        match name.as_str() {
            "transcript-file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            "locator" => locator = field.text().await.map_err(read_text)?,
            "video_list" => video_list = Some(field.text().await.map_err(read_text)?),
            "language" => language = Some(field.text().await.map_err(read_text)?),
            _ => {}
        }
    }

    if locator.trim().is_empty() {
        return Err(ApiError::BadRequest("Video locator is required.".to_string()));
    }
    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("A transcript file is required.".to_string()))?;
    let videos: Vec<VideoSource> = match video_list.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(raw).map_err(|_| empty_video_data())?
        }
        _ => return Err(empty_video_data()),
    };

    let subs = state
        .transcripts
        .upload(
            &auth.claims,
            TranscriptUpload {
                locator,
                language,
                filename,
                data,
                videos,
            },
        )
        .await?;

    Ok(SubsResponse::success(subs))
}

/// `GET /api/transcripts/download?locator=&subs_id=&format=srt|txt`
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        None | Some("") => TranscriptFormat::Srt,
        Some(raw) => TranscriptFormat::from_extension(raw)
            .map_err(|_| ApiError::BadRequest(format!("Invalid transcript format `{raw}`")))?,
    };
    let file = state
        .transcripts
        .download(&auth.claims, &query.locator, query.subs_id.as_deref(), format)
        .await?;
    file_response(file)
}

pub async fn choose(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChooseRequest>,
) -> Result<Json<SubsResponse>, ApiError> {
    let subs = state
        .transcripts
        .choose(
            &auth.claims,
            &request.locator,
            &request.html5_id,
            &request.videos,
        )
        .await?;
    Ok(SubsResponse::success(subs))
}

pub async fn replace(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<VideoRequest>,
) -> Result<Json<SubsResponse>, ApiError> {
    let subs = state
        .transcripts
        .replace(&auth.claims, &request.locator, &request.videos)
        .await?;
    Ok(SubsResponse::success(subs))
}

pub async fn rename(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<VideoRequest>,
) -> Result<Json<SubsResponse>, ApiError> {
    let subs = state
        .transcripts
        .rename(&auth.claims, &request.locator, &request.videos)
        .await?;
    Ok(SubsResponse::success(subs))
}

pub async fn save(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SaveRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .transcripts
        .save(
            &auth.claims,
            &request.locator,
            &request.metadata,
            &request.current_subs,
        )
        .await?;
    Ok(Json(serde_json::json!({ "status": "Success" })))
}
