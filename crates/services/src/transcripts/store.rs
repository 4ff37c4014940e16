use std::sync::Arc;

use chrono::{DateTime, Local};
use lectern_db::CourseKey;
use tracing::{debug, info};

use super::codec::{self, TranscriptFormat};
use super::filenames::{DEFAULT_LANGUAGE, backup_filename, subs_filename};
use super::sjson::Sjson;
use super::speed::generate_subs;
use super::{TranscriptError, TranscriptResult};
use crate::dao::DaoError;
use crate::store::AssetStore;

/// Typed access to transcript assets. Filenames come from [`super::filenames`].
#[derive(Clone)]
pub struct TranscriptStore {
    assets: Arc<dyn AssetStore>,
}

impl TranscriptStore {
    pub fn new(assets: Arc<dyn AssetStore>) -> Self {
        Self { assets }
    }

    pub async fn save_raw(
        &self,
        course_key: &CourseKey,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> TranscriptResult<()> {
        debug!(course = %course_key, filename, size = bytes.len(), "Saving transcript asset");
        self.assets
            .save(course_key, filename, content_type, bytes)
            .await?;
        Ok(())
    }

    pub async fn load_raw(&self, course_key: &CourseKey, filename: &str) -> TranscriptResult<Vec<u8>> {
        match self.assets.find(course_key, filename).await {
            Ok(asset) => Ok(asset.into_bytes()),
            Err(DaoError::NotFound) => Err(TranscriptError::NotFound(format!(
                "Transcript asset {filename} not found."
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes an asset; absent assets are not an error.
    pub async fn remove(&self, course_key: &CourseKey, filename: &str) -> TranscriptResult<()> {
        if self.assets.delete(course_key, filename).await? {
            info!(course = %course_key, filename, "Transcript asset was removed from store");
        }
        Ok(())
    }

    pub async fn save_sjson(
        &self,
        course_key: &CourseKey,
        subs_id: &str,
        lang: &str,
        sjson: &Sjson,
    ) -> TranscriptResult<String> {
        let filename = subs_filename(subs_id, lang);
        let bytes = sjson.to_pretty_bytes()?;
        self.save_raw(course_key, &filename, TranscriptFormat::Sjson.mime_type(), bytes)
            .await?;
        Ok(filename)
    }

    pub async fn find_sjson(
        &self,
        course_key: &CourseKey,
        subs_id: &str,
        lang: &str,
    ) -> TranscriptResult<Option<Sjson>> {
        match self.load_raw(course_key, &subs_filename(subs_id, lang)).await {
            Ok(bytes) => Ok(Some(Sjson::from_slice(&bytes)?)),
            Err(TranscriptError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn load_sjson(
        &self,
        course_key: &CourseKey,
        subs_id: &str,
        lang: &str,
    ) -> TranscriptResult<Sjson> {
        let bytes = self.load_raw(course_key, &subs_filename(subs_id, lang)).await?;
        Ok(Sjson::from_slice(&bytes)?)
    }

    pub async fn sjson_exists(
        &self,
        course_key: &CourseKey,
        subs_id: &str,
        lang: &str,
    ) -> TranscriptResult<bool> {
        Ok(self
            .assets
            .exists(course_key, &subs_filename(subs_id, lang))
            .await?)
    }

    pub async fn remove_sjson(
        &self,
        course_key: &CourseKey,
        subs_id: &str,
        lang: &str,
    ) -> TranscriptResult<()> {
        self.remove(course_key, &subs_filename(subs_id, lang)).await
    }

    /// Copies the default-language SJSON of `from` to `to`, keeping the original.
    pub async fn copy_sjson(
        &self,
        course_key: &CourseKey,
        from: &str,
        to: &str,
    ) -> TranscriptResult<()> {
        let sjson = self.load_sjson(course_key, from, DEFAULT_LANGUAGE).await?;
        self.save_sjson(course_key, to, DEFAULT_LANGUAGE, &sjson).await?;
        Ok(())
    }

    /// Converts an uploaded file once, then stores one SJSON per `(speed, subs_id)` entry,
    /// timings multiplied by the speed.
    pub async fn generate_from_source(
        &self,
        course_key: &CourseKey,
        speed_map: &[(f64, String)],
        ext: &str,
        data: &str,
        lang: &str,
    ) -> TranscriptResult<Sjson> {
        let base = codec::sjson_from_source(ext, data)?;
        for (speed, subs_id) in speed_map {
            self.save_sjson(course_key, subs_id, lang, &generate_subs(*speed, 1.0, &base))
                .await?;
        }
        Ok(base)
    }

    /// Keeps a timestamped copy of the default-language SJSON for `subs_id`, if there is one.
    pub async fn backup_sjson(
        &self,
        course_key: &CourseKey,
        subs_id: &str,
        at: &DateTime<Local>,
    ) -> TranscriptResult<Option<String>> {
        let filename = subs_filename(subs_id, DEFAULT_LANGUAGE);
        let bytes = match self.load_raw(course_key, &filename).await {
            Ok(bytes) => bytes,
            Err(TranscriptError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let backup = backup_filename(&filename, at);
        self.save_raw(course_key, &backup, TranscriptFormat::Sjson.mime_type(), bytes)
            .await?;
        Ok(Some(backup))
    }
}
