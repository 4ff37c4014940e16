use std::collections::BTreeMap;

use bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::keys::{CourseKey, UsageKey};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Authoring unit that owns a transcript set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoBlock {
    pub location: UsageKey,
    pub course_key: CourseKey,
    #[serde(default)]
    pub display_name: String,
    /// Default (English) transcript id; empty when unset.
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub youtube_id_0_75: String,
    #[serde(default)]
    pub youtube_id_1_0: String,
    #[serde(default)]
    pub youtube_id_1_25: String,
    #[serde(default)]
    pub youtube_id_1_5: String,
    #[serde(default)]
    pub html5_sources: Vec<String>,
    /// Language code to uploaded transcript filename, non-default languages only.
    #[serde(default)]
    pub transcripts: BTreeMap<String, String>,
    #[serde(default = "default_language")]
    pub transcript_language: String,
    /// Static directory of XML-imported courses, used for the learner fallback redirect.
    #[serde(default)]
    pub data_dir: Option<String>,
    pub updated_at: DateTime,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl VideoBlock {
    pub const COLLECTION: &'static str = "video_blocks";

    pub fn new(location: UsageKey) -> Self {
        Self {
            course_key: location.course_key().clone(),
            location,
            display_name: String::new(),
            sub: String::new(),
            youtube_id_0_75: String::new(),
            youtube_id_1_0: String::new(),
            youtube_id_1_25: String::new(),
            youtube_id_1_5: String::new(),
            html5_sources: Vec::new(),
            transcripts: BTreeMap::new(),
            transcript_language: default_language(),
            data_dir: None,
            updated_at: DateTime::now(),
        }
    }

    pub fn is_video(&self) -> bool {
        self.location.block_type() == "video"
    }

    /// Returns a copy with every field present in `patch` overwritten.
    pub fn apply(&self, patch: &VideoBlockPatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = &patch.display_name {
            next.display_name = v.clone();
        }
        if let Some(v) = &patch.sub {
            next.sub = v.clone();
        }
        if let Some(v) = &patch.youtube_id_0_75 {
            next.youtube_id_0_75 = v.clone();
        }
        if let Some(v) = &patch.youtube_id_1_0 {
            next.youtube_id_1_0 = v.clone();
        }
        if let Some(v) = &patch.youtube_id_1_25 {
            next.youtube_id_1_25 = v.clone();
        }
        if let Some(v) = &patch.youtube_id_1_5 {
            next.youtube_id_1_5 = v.clone();
        }
        if let Some(v) = &patch.html5_sources {
            next.html5_sources = v.clone();
        }
        if let Some(v) = &patch.transcripts {
            next.transcripts = v.clone();
        }
        if let Some(v) = &patch.transcript_language {
            next.transcript_language = v.clone();
        }
        next.updated_at = DateTime::now();
        next
    }
}

/// Partial update of the authoring fields of a [`VideoBlock`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoBlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_id_0_75: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_id_1_0: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_id_1_25: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_id_1_5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html5_sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcripts: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_language: Option<String>,
}

impl VideoBlockPatch {
    pub fn sub(sub: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
            ..Self::default()
        }
    }
}
