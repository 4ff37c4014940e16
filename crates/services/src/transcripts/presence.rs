//! Classification of the transcripts available for a video across its sources.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TranscriptResult;
use super::filenames::DEFAULT_LANGUAGE;
use super::store::TranscriptStore;
use super::youtube::CaptionSource;
use lectern_db::models::VideoBlock;

/// Authoring UI instruction derived from a [`PresenceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Found,
    Import,
    Replace,
    Choose,
    UseExisting,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Youtube,
    Html5,
    #[serde(other)]
    Other,
}

/// One configured video source as sent by the authoring UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub video: String,
    #[serde(default)]
    pub mode: String,
}

impl VideoSource {
    pub fn youtube(id: &str) -> Self {
        Self {
            source_type: SourceType::Youtube,
            video: id.to_string(),
            mode: "youtube".to_string(),
        }
    }

    pub fn html5(id: &str, mode: &str) -> Self {
        Self {
            source_type: SourceType::Html5,
            video: id.to_string(),
            mode: mode.to_string(),
        }
    }
}

/// The YouTube id of the first YouTube source, if any.
pub fn youtube_source(videos: &[VideoSource]) -> Option<&str> {
    videos
        .iter()
        .find(|v| v.source_type == SourceType::Youtube && !v.video.is_empty())
        .map(|v| v.video.as_str())
}

pub fn html5_sources(videos: &[VideoSource]) -> Vec<&str> {
    videos
        .iter()
        .filter(|v| v.source_type == SourceType::Html5 && !v.video.is_empty())
        .map(|v| v.video.as_str())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub current_item_subs: Option<String>,
    pub is_youtube_mode: bool,
    pub youtube_local: bool,
    pub youtube_server: bool,
    pub youtube_diff: bool,
    pub html5_local: Vec<String>,
    pub html5_equal: bool,
    pub command: Command,
    pub subs: String,
}

impl Default for PresenceRecord {
    fn default() -> Self {
        Self {
            current_item_subs: None,
            is_youtube_mode: false,
            youtube_local: false,
            youtube_server: false,
            youtube_diff: true,
            html5_local: Vec::new(),
            html5_equal: false,
            command: Command::NotFound,
            subs: String::new(),
        }
    }
}

/// Decision table; rows are evaluated top to bottom and the first match wins.
pub fn decide(record: &PresenceRecord, youtube_id: &str) -> (Command, String) {
    let first_html5 = || record.html5_local.first().cloned().unwrap_or_default();

    if record.is_youtube_mode && record.youtube_local && record.youtube_server && record.youtube_diff
    {
        (Command::Replace, youtube_id.to_string())
    } else if record.is_youtube_mode && record.youtube_local {
        (Command::Found, youtube_id.to_string())
    } else if record.is_youtube_mode && record.youtube_server {
        (Command::Import, String::new())
    } else if record.html5_local.len() == 1 || record.html5_equal {
        (Command::Found, first_html5())
    } else if record.html5_local.len() >= 2 {
        (Command::Choose, first_html5())
    } else if record.current_item_subs.is_some() && !record.is_youtube_mode {
        (Command::UseExisting, String::new())
    } else {
        (Command::NotFound, String::new())
    }
}

/// Builds the presence record for `item`, consulting the caption host for YouTube sources.
pub async fn resolve(
    store: &TranscriptStore,
    captions: &dyn CaptionSource,
    item: &VideoBlock,
    videos: &[VideoSource],
) -> TranscriptResult<PresenceRecord> {
    let course = &item.course_key;
    let mut record = PresenceRecord::default();

    if !item.sub.is_empty() && store.sjson_exists(course, &item.sub, DEFAULT_LANGUAGE).await? {
        record.current_item_subs = Some(item.sub.clone());
    }

    let youtube_id = youtube_source(videos).unwrap_or_default();
    if !youtube_id.is_empty() {
        record.is_youtube_mode = true;
        let local = store.find_sjson(course, youtube_id, DEFAULT_LANGUAGE).await?;
        record.youtube_local = local.is_some();

        match captions.fetch(youtube_id, DEFAULT_LANGUAGE).await {
            Ok(remote) => {
                record.youtube_server = true;
                if let Some(local) = &local {
                    record.youtube_diff = *local != remote;
                }
            }
            Err(e) => {
                debug!(video_id = youtube_id, error = %e, "Remote captions unavailable");
            }
        }
    }

    let mut html5_subs = Vec::new();
    for id in html5_sources(videos) {
        if let Some(sjson) = store.find_sjson(course, id, DEFAULT_LANGUAGE).await? {
            record.html5_local.push(id.to_string());
            html5_subs.push(sjson);
        }
    }
    if let [first, second] = html5_subs.as_slice() {
        record.html5_equal = first == second;
    }

    let (command, subs) = decide(&record, youtube_id);
    debug!(
        location = %item.location,
        command = ?command,
        subs = %subs,
        "Resolved transcript presence"
    );
    record.command = command;
    record.subs = subs;
    Ok(record)
}
