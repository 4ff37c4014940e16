use std::collections::BTreeSet;
use std::sync::Arc;

use lectern_config::TranscriptSettings;
use lectern_db::{
    UsageKey,
    models::{VideoBlock, VideoBlockPatch},
};
use tracing::{debug, info, warn};

use super::codec::{self, CodecError, TranscriptFormat};
use super::filenames::{
    DEFAULT_LANGUAGE, html5_ids, is_valid_subs_id, split_extension, strip_directory,
    subs_filename, youtube_speed_map, youtube_speed_of,
};
use super::presence::{self, PresenceRecord, VideoSource, html5_sources, youtube_source};
use super::sjson::Sjson;
use super::speed::{normalize_to_1x, scale_to_speed};
use super::store::TranscriptStore;
use super::youtube::CaptionSource;
use super::{Clock, CourseAccess, Services, TranscriptError, TranscriptResult};
use crate::dao::DaoError;
use crate::store::BlockStore;

const NO_SUCH_TRANSCRIPT: &str = "No such transcript.";
const EMPTY_VIDEO_DATA: &str = "Incoming video data is empty.";

/// A rendered transcript ready to be sent to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFile {
    pub content: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
    pub language: String,
    /// Served as a download rather than inline.
    pub attachment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Transcript(TranscriptFile),
    /// Static-content fallback for courses imported from XML.
    Redirect(String),
}

/// An author-supplied transcript file.
#[derive(Debug, Clone)]
pub struct TranscriptUpload {
    pub locator: String,
    pub language: Option<String>,
    pub filename: String,
    pub data: Vec<u8>,
    pub videos: Vec<VideoSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefetchOutcome {
    pub youtube_id: String,
    pub backup: Option<String>,
}

fn decode_text(bytes: &[u8]) -> Result<String, CodecError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidEncoding)
}

fn render(sjson: &Sjson, format: TranscriptFormat) -> TranscriptResult<Vec<u8>> {
    let content = match format {
        TranscriptFormat::Srt => codec::generate_srt_from_sjson(sjson, 1.0)?,
        TranscriptFormat::Txt => codec::to_txt(sjson),
        TranscriptFormat::Sjson => sjson.to_json()?,
        TranscriptFormat::Sbv => {
            return Err(TranscriptError::Validation(format!(
                "Invalid transcript format `{format}`"
            )));
        }
    };
    Ok(content.into_bytes())
}

/// Language served when the learner did not pick one.
pub fn default_transcript_language(item: &VideoBlock) -> String {
    let available = |lang: &str| item.transcripts.get(lang).is_some_and(|f| !f.is_empty());
    if available(&item.transcript_language) {
        item.transcript_language.clone()
    } else if !item.sub.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        item.transcripts
            .iter()
            .find(|(_, f)| !f.is_empty())
            .map(|(lang, _)| lang.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }
}

pub struct TranscriptService {
    store: TranscriptStore,
    blocks: Arc<dyn BlockStore>,
    captions: Arc<dyn CaptionSource>,
    clock: Arc<dyn Clock>,
    static_url_prefix: String,
}

impl TranscriptService {
    pub fn new(services: Services, settings: &TranscriptSettings) -> Self {
        Self {
            store: TranscriptStore::new(services.assets),
            blocks: services.blocks,
            captions: services.captions,
            clock: services.clock,
            static_url_prefix: settings.static_url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    pub async fn load_item(&self, locator: &str) -> TranscriptResult<VideoBlock> {
        if locator.trim().is_empty() {
            return Err(TranscriptError::Validation(
                "Video locator is required.".to_string(),
            ));
        }
        let location = UsageKey::parse(locator.trim())?;
        let item = match self.blocks.get(&location).await {
            Ok(item) => item,
            Err(DaoError::NotFound) => {
                return Err(TranscriptError::NotFound(
                    "Cannot find item by locator.".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        if !item.is_video() {
            return Err(TranscriptError::Validation(
                r#"Transcripts are supported only for "video" modules."#.to_string(),
            ));
        }
        Ok(item)
    }

    async fn load_for_edit(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
    ) -> TranscriptResult<VideoBlock> {
        let item = self.load_item(locator).await?;
        if !access.can_edit(&item.course_key) {
            return Err(TranscriptError::PermissionDenied(
                "You do not have permission to edit transcripts in this course.".to_string(),
            ));
        }
        Ok(item)
    }

    async fn persist(&self, item: &VideoBlock) -> TranscriptResult<()> {
        self.blocks.save(item).await?;
        Ok(())
    }

    /// Converts an uploaded file and stores it under every given video source.
    /// Returns the transcript id the block now points at.
    pub async fn upload(
        &self,
        access: &dyn CourseAccess,
        upload: TranscriptUpload,
    ) -> TranscriptResult<String> {
        if upload.locator.trim().is_empty() {
            return Err(TranscriptError::Validation(
                "Video locator is required.".to_string(),
            ));
        }
        let filename = strip_directory(upload.filename.trim()).to_string();
        if filename.is_empty() {
            return Err(TranscriptError::Validation(
                "A transcript file is required.".to_string(),
            ));
        }
        let (_, ext) = split_extension(&filename);
        let Some(ext) = ext else {
            return Err(TranscriptError::Validation(
                "This transcript file type is not supported.".to_string(),
            ));
        };
        let format = TranscriptFormat::from_extension(&ext)?;

        let names: Vec<String> = upload
            .videos
            .iter()
            .map(|v| v.video.clone())
            .filter(|id| is_valid_subs_id(id))
            .collect();
        let Some(subs) = names.last().cloned() else {
            return Err(TranscriptError::Validation(EMPTY_VIDEO_DATA.to_string()));
        };

        let item = self.load_for_edit(access, &upload.locator).await?;
        let lang = upload
            .language
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();
        let data = decode_text(&upload.data)?;

        let speed_map: Vec<(f64, String)> = names.iter().map(|n| (1.0, n.clone())).collect();
        self.store
            .generate_from_source(&item.course_key, &speed_map, &ext, &data, &lang)
            .await?;

        let patch = if lang == DEFAULT_LANGUAGE {
            VideoBlockPatch::sub(subs.clone())
        } else {
            self.store
                .save_raw(&item.course_key, &filename, format.mime_type(), upload.data)
                .await?;
            let mut transcripts = item.transcripts.clone();
            transcripts.insert(lang.clone(), filename.clone());
            VideoBlockPatch {
                transcripts: Some(transcripts),
                ..VideoBlockPatch::default()
            }
        };
        self.persist(&item.apply(&patch)).await?;

        info!(location = %item.location, %lang, %filename, subs = %subs, "Transcript uploaded");
        Ok(subs)
    }

    /// Default-language transcript `subs_id` (or the block's current one) in `format`.
    pub async fn download(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
        subs_id: Option<&str>,
        format: TranscriptFormat,
    ) -> TranscriptResult<TranscriptFile> {
        let item = self.load_for_edit(access, locator).await?;
        let subs_id = subs_id
            .filter(|s| !s.is_empty())
            .unwrap_or(item.sub.as_str())
            .to_string();
        if subs_id.is_empty() {
            return Err(TranscriptError::NotFound(NO_SUCH_TRANSCRIPT.to_string()));
        }
        let stored = match self
            .store
            .load_raw(&item.course_key, &subs_filename(&subs_id, DEFAULT_LANGUAGE))
            .await
        {
            Ok(bytes) => Sjson::text_from_slice(&bytes),
            Err(TranscriptError::NotFound(_)) => {
                return Err(TranscriptError::NotFound(NO_SUCH_TRANSCRIPT.to_string()));
            }
            Err(e) => return Err(e),
        };
        let content = codec::convert(&stored, TranscriptFormat::Sjson, format)?;

        Ok(TranscriptFile {
            content: content.into_bytes(),
            filename: format!("{subs_id}.{}", format.extension()),
            content_type: format.mime_type(),
            language: DEFAULT_LANGUAGE.to_string(),
            attachment: true,
        })
    }

    pub async fn check(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
        videos: &[VideoSource],
    ) -> TranscriptResult<PresenceRecord> {
        let item = self.load_for_edit(access, locator).await?;
        presence::resolve(&self.store, self.captions.as_ref(), &item, videos).await
    }

    /// Keeps `html5_id` and drops the other html5 transcripts.
    pub async fn choose(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
        html5_id: &str,
        videos: &[VideoSource],
    ) -> TranscriptResult<String> {
        let item = self.load_for_edit(access, locator).await?;
        let course = &item.course_key;
        if html5_id.is_empty()
            || !self
                .store
                .sjson_exists(course, html5_id, DEFAULT_LANGUAGE)
                .await?
        {
            return Err(TranscriptError::NotFound(NO_SUCH_TRANSCRIPT.to_string()));
        }

        for other in html5_sources(videos) {
            if other != html5_id {
                self.store
                    .remove_sjson(course, other, DEFAULT_LANGUAGE)
                    .await?;
            }
        }
        self.persist(&item.apply(&VideoBlockPatch::sub(html5_id)))
            .await?;
        Ok(html5_id.to_string())
    }

    /// Replaces the local transcript with the captions currently on YouTube.
    pub async fn replace(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
        videos: &[VideoSource],
    ) -> TranscriptResult<String> {
        let Some(youtube_id) = youtube_source(videos) else {
            return Err(TranscriptError::Validation(
                "YouTube ID is required.".to_string(),
            ));
        };
        let item = self.load_for_edit(access, locator).await?;
        self.download_youtube_subs(youtube_id, &item).await?;
        Ok(youtube_id.to_string())
    }

    /// Copies the current transcript to every html5 source id.
    pub async fn rename(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
        videos: &[VideoSource],
    ) -> TranscriptResult<String> {
        let item = self.load_for_edit(access, locator).await?;
        let ids = html5_sources(videos);
        let Some(last) = ids.last() else {
            return Err(TranscriptError::Validation(EMPTY_VIDEO_DATA.to_string()));
        };
        if item.sub.is_empty() {
            return Err(TranscriptError::NotFound(NO_SUCH_TRANSCRIPT.to_string()));
        }
        let sjson = self
            .store
            .find_sjson(&item.course_key, &item.sub, DEFAULT_LANGUAGE)
            .await?
            .ok_or_else(|| TranscriptError::NotFound(NO_SUCH_TRANSCRIPT.to_string()))?;

        for id in &ids {
            if *id != item.sub {
                self.store
                    .save_sjson(&item.course_key, id, DEFAULT_LANGUAGE, &sjson)
                    .await?;
            }
        }
        self.persist(&item.apply(&VideoBlockPatch::sub(*last)))
            .await?;
        Ok(last.to_string())
    }

    /// Writes block metadata and keeps the stored transcripts in line with it.
    pub async fn save(
        &self,
        access: &dyn CourseAccess,
        locator: &str,
        patch: &VideoBlockPatch,
        current_subs: &[String],
    ) -> TranscriptResult<VideoBlock> {
        let old = self.load_for_edit(access, locator).await?;
        let mut item = old.apply(patch);
        let course = item.course_key.clone();

        if patch.transcripts.is_some() {
            item.transcripts = item
                .transcripts
                .into_iter()
                .map(|(lang, filename)| (lang, strip_directory(&filename).to_string()))
                .collect();
        }

        if patch.sub.is_some() && item.sub != old.sub {
            if item.sub.is_empty() {
                for subs_id in current_subs.iter().filter(|s| !s.is_empty()) {
                    self.store
                        .remove_sjson(&course, subs_id, DEFAULT_LANGUAGE)
                        .await?;
                }
            } else {
                for id in html5_ids(&item.html5_sources) {
                    if id == item.sub || id.is_empty() {
                        continue;
                    }
                    match self.store.copy_sjson(&course, &item.sub, &id).await {
                        Ok(()) => {}
                        Err(TranscriptError::NotFound(_)) => {
                            debug!(from = %item.sub, to = %id, "Nothing to copy, source transcript does not exist");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        if patch.transcripts.is_some() {
            self.regenerate_translations(&old, &item).await?;
        }

        self.persist(&item).await?;
        Ok(item)
    }

    async fn regenerate_translations(
        &self,
        old: &VideoBlock,
        item: &VideoBlock,
    ) -> TranscriptResult<()> {
        let course = &item.course_key;
        let html5 = html5_ids(&item.html5_sources);
        let mut video_ids: Vec<String> = html5.clone();
        video_ids.push(item.youtube_id_1_0.clone());
        video_ids.retain(|id| !id.is_empty());

        for lang in old.transcripts.keys() {
            if item.transcripts.contains_key(lang) {
                continue;
            }
            for id in &video_ids {
                self.store.remove_sjson(course, id, lang).await?;
            }
        }

        let mut speed_map = youtube_speed_map(item);
        for id in html5.into_iter().filter(|id| !id.is_empty()) {
            if !speed_map.iter().any(|(_, existing)| *existing == id) {
                speed_map.push((1.0, id));
            }
        }

        for (lang, filename) in &item.transcripts {
            if filename.is_empty() {
                continue;
            }
            match self.generate_translation(item, filename, &speed_map, lang).await {
                Ok(()) => {}
                Err(e @ (TranscriptError::NotFound(_) | TranscriptError::Codec(_))) => {
                    warn!(%lang, %filename, error = %e, "Could not regenerate translation");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn generate_translation(
        &self,
        item: &VideoBlock,
        filename: &str,
        speed_map: &[(f64, String)],
        lang: &str,
    ) -> TranscriptResult<()> {
        let bytes = self.store.load_raw(&item.course_key, filename).await?;
        let data = decode_text(&bytes)?;
        let (_, ext) = split_extension(filename);
        let ext = ext.ok_or_else(|| CodecError::UnsupportedFormat(filename.to_string()))?;
        self.store
            .generate_from_source(&item.course_key, speed_map, &ext, &data, lang)
            .await?;
        Ok(())
    }

    /// Fetches English captions for `youtube_id`, stores them and points the block at them.
    pub async fn download_youtube_subs(
        &self,
        youtube_id: &str,
        item: &VideoBlock,
    ) -> TranscriptResult<VideoBlock> {
        let sjson = self.captions.fetch(youtube_id, DEFAULT_LANGUAGE).await?;
        self.store
            .save_sjson(&item.course_key, youtube_id, DEFAULT_LANGUAGE, &sjson)
            .await?;
        let next = item.apply(&VideoBlockPatch::sub(youtube_id));
        self.persist(&next).await?;
        info!(location = %item.location, video_id = youtube_id, cues = sjson.len(), "Downloaded YouTube transcript");
        Ok(next)
    }

    /// Backs up the block's 1.0x YouTube transcript, then downloads it again.
    pub async fn refetch(&self, locator: &str) -> TranscriptResult<RefetchOutcome> {
        let item = self.load_item(locator).await?;
        if item.youtube_id_1_0.is_empty() {
            return Err(TranscriptError::Validation(
                "YouTube ID is required.".to_string(),
            ));
        }
        let youtube_id = item.youtube_id_1_0.clone();
        let backup = self
            .store
            .backup_sjson(&item.course_key, &youtube_id, &self.clock.now())
            .await?;
        self.download_youtube_subs(&youtube_id, &item).await?;
        Ok(RefetchOutcome { youtube_id, backup })
    }

    fn candidate_ids(item: &VideoBlock, video_id: Option<&str>) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let leading = [
            video_id.unwrap_or_default(),
            item.sub.as_str(),
            item.youtube_id_1_0.as_str(),
        ];
        for id in leading
            .into_iter()
            .map(str::to_string)
            .chain(html5_ids(&item.html5_sources))
        {
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// First stored SJSON among `ids`, falling back to the uploaded file for `lang`.
    async fn lookup(
        &self,
        item: &VideoBlock,
        lang: &str,
        ids: &[String],
    ) -> TranscriptResult<Option<(Sjson, String)>> {
        let course = &item.course_key;
        for (position, id) in ids.iter().enumerate() {
            if let Some(sjson) = self.store.find_sjson(course, id, lang).await? {
                return Ok(Some((sjson, id.clone())));
            }
            if position > 0 {
                continue;
            }
            if let Some(found) = self.lookup_uploaded(item, lang).await? {
                return Ok(Some(found));
            }
        }
        if ids.is_empty() {
            return self.lookup_uploaded(item, lang).await;
        }
        Ok(None)
    }

    async fn lookup_uploaded(
        &self,
        item: &VideoBlock,
        lang: &str,
    ) -> TranscriptResult<Option<(Sjson, String)>> {
        let Some(filename) = item.transcripts.get(lang).filter(|f| !f.is_empty()) else {
            return Ok(None);
        };
        let bytes = match self.store.load_raw(&item.course_key, filename).await {
            Ok(bytes) => bytes,
            Err(TranscriptError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let (stem, ext) = split_extension(filename);
        let ext = ext.unwrap_or_else(|| TranscriptFormat::Srt.extension().to_string());
        let sjson = codec::sjson_from_source(&ext, &decode_text(&bytes)?)?;
        Ok(Some((sjson, stem.to_string())))
    }

    /// Resolves the transcript for `lang`, re-timed when `video_id` is a non-1.0x YouTube stream.
    pub async fn find_transcript(
        &self,
        item: &VideoBlock,
        lang: &str,
        video_id: Option<&str>,
    ) -> TranscriptResult<(Sjson, String)> {
        let not_found = || TranscriptError::NotFound(format!("No transcript for `{lang}` language"));
        let requested = video_id.filter(|v| !v.is_empty());
        let speed = requested
            .and_then(|v| youtube_speed_of(item, v))
            .filter(|s| *s != 1.0);

        let (Some(video_id), Some(speed)) = (requested, speed) else {
            return self
                .lookup(item, lang, &Self::candidate_ids(item, requested))
                .await?
                .ok_or_else(not_found);
        };

        let other_speeds: Vec<(f64, String)> = youtube_speed_map(item)
            .into_iter()
            .filter(|(s, _)| *s != 1.0)
            .collect();
        let base_ids: Vec<String> = Self::candidate_ids(item, None)
            .into_iter()
            .filter(|id| !other_speeds.iter().any(|(_, other)| other == id))
            .collect();

        if let Some((sjson, _)) = self.lookup(item, lang, &base_ids).await? {
            return Ok((scale_to_speed(&sjson, speed)?, video_id.to_string()));
        }
        for (source_speed, id) in &other_speeds {
            if let Some(sjson) = self.store.find_sjson(&item.course_key, id, lang).await? {
                let normal = normalize_to_1x(&sjson, *source_speed)?;
                return Ok((scale_to_speed(&normal, speed)?, video_id.to_string()));
            }
        }
        Err(not_found())
    }

    /// Learner-facing SJSON for `lang`, an uploaded file by name, or a static redirect.
    pub async fn translation(
        &self,
        locator: &str,
        lang: Option<&str>,
        video_id: Option<&str>,
        filename: Option<&str>,
    ) -> TranscriptResult<TranslationOutcome> {
        let Some(lang) = lang.filter(|l| !l.is_empty()) else {
            return Err(TranscriptError::Validation(
                "Language is required.".to_string(),
            ));
        };
        let item = self.load_item(locator).await?;

        if let Some(filename) = filename.map(strip_directory).filter(|f| !f.is_empty()) {
            let content = self.store.load_raw(&item.course_key, filename).await?;
            return Ok(TranslationOutcome::Transcript(TranscriptFile {
                content,
                filename: filename.to_string(),
                content_type: TranscriptFormat::Srt.mime_type(),
                language: lang.to_string(),
                attachment: true,
            }));
        }

        if lang != DEFAULT_LANGUAGE && !item.transcripts.contains_key(lang) {
            return Err(TranscriptError::NotFound(format!(
                "No transcript for `{lang}` language"
            )));
        }

        match self.find_transcript(&item, lang, video_id).await {
            Ok((sjson, base)) => Ok(TranslationOutcome::Transcript(TranscriptFile {
                content: render(&sjson, TranscriptFormat::Sjson)?,
                filename: format!("{lang}_{base}.sjson"),
                content_type: TranscriptFormat::Sjson.mime_type(),
                language: lang.to_string(),
                attachment: false,
            })),
            Err(TranscriptError::NotFound(message)) if lang == DEFAULT_LANGUAGE => {
                let subs_id = video_id.filter(|v| !v.is_empty()).unwrap_or(item.sub.as_str());
                match item.data_dir.as_deref().filter(|d| !d.is_empty()) {
                    Some(data_dir) if !subs_id.is_empty() => {
                        let location = format!(
                            "{}/{}/{}",
                            self.static_url_prefix,
                            data_dir.trim_matches('/'),
                            subs_filename(subs_id, DEFAULT_LANGUAGE)
                        );
                        debug!(%location, "Redirecting to static transcript");
                        Ok(TranslationOutcome::Redirect(location))
                    }
                    _ => Err(TranscriptError::NotFound(message)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Languages with a resolvable transcript, sorted.
    pub async fn available_translations(&self, locator: &str) -> TranscriptResult<Vec<String>> {
        let item = self.load_item(locator).await?;
        let mut langs: BTreeSet<&str> = item
            .transcripts
            .iter()
            .filter(|(_, f)| !f.is_empty())
            .map(|(lang, _)| lang.as_str())
            .collect();
        langs.insert(DEFAULT_LANGUAGE);

        let mut available = Vec::new();
        for lang in langs {
            match self.find_transcript(&item, lang, None).await {
                Ok(_) => available.push(lang.to_string()),
                Err(TranscriptError::NotFound(_) | TranscriptError::Codec(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(available)
    }

    /// Learner download named `<lang>_<base>.<ext>`.
    pub async fn learner_download(
        &self,
        locator: &str,
        lang: Option<&str>,
        format: TranscriptFormat,
    ) -> TranscriptResult<TranscriptFile> {
        let item = self.load_item(locator).await?;
        let lang = lang
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_transcript_language(&item));
        let (sjson, base) = self.find_transcript(&item, &lang, None).await?;
        let content = render(&sjson, format)?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(TranscriptError::NotFound("No transcript content".to_string()));
        }
        Ok(TranscriptFile {
            content,
            filename: format!("{lang}_{base}.{}", format.extension()),
            content_type: format.mime_type(),
            language: lang,
            attachment: true,
        })
    }
}
