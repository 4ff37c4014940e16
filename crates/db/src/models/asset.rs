use bson::{Binary, DateTime, spec::BinarySubtype};
use serde::{Deserialize, Serialize};

use crate::keys::CourseKey;

/// A blob in the course asset store, addressed by `(course_key, filename)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAsset {
    #[serde(rename = "_id")]
    pub id: String,
    pub course_key: String,
    pub filename: String,
    pub content_type: String,
    pub length: u64,
    pub data: Binary,
    pub uploaded_at: DateTime,
}

impl StoredAsset {
    pub const COLLECTION: &'static str = "transcript_assets";

    pub fn new(course_key: &CourseKey, filename: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            id: course_key.asset_key(filename),
            course_key: course_key.to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            length: bytes.len() as u64,
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            },
            uploaded_at: DateTime::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.bytes
    }
}
