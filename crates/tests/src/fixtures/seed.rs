use std::sync::Arc;

use lectern_db::{CourseKey, UsageKey, models::VideoBlock};
use lectern_services::{
    store::{AssetStore, BlockStore},
    transcripts::{Sjson, TranscriptStore},
};
use serde_json::Value;

use super::test_app::TestApp;

pub const COURSE: &str = "course-v1:edX+DemoX+Demo";
pub const VIDEO: &str = "block-v1:edX+DemoX+Demo+type@video+block@intro";
pub const PROBLEM: &str = "block-v1:edX+DemoX+Demo+type@problem+block@quiz";

pub fn course() -> CourseKey {
    CourseKey::parse(COURSE).unwrap()
}

/// Builds an SJSON document from `(start, end, text)` triples.
pub fn sjson(cues: &[(u64, u64, &str)]) -> Sjson {
    let mut out = Sjson::default();
    for (start, end, text) in cues {
        out.push(*start, *end, *text);
    }
    out
}

pub fn youtube(id: &str) -> Value {
    serde_json::json!({ "type": "youtube", "video": id, "mode": "youtube" })
}

pub fn html5(id: &str) -> Value {
    serde_json::json!({ "type": "html5", "video": id, "mode": "mp4" })
}

impl TestApp {
    /// Token granting authoring rights on [`COURSE`].
    pub fn author_token(&self) -> String {
        self.auth
            .issue_token("author@test.com", &[course()], false)
            .unwrap()
    }

    /// Valid token without any course grant.
    pub fn outsider_token(&self) -> String {
        self.auth
            .issue_token("outsider@test.com", &[], false)
            .unwrap()
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn transcript_store(&self) -> TranscriptStore {
        let assets: Arc<dyn AssetStore> = self.assets.clone();
        TranscriptStore::new(assets)
    }

    /// Stores the [`VIDEO`] block after letting `configure` fill in its fields.
    pub async fn seed_video(&self, configure: impl FnOnce(&mut VideoBlock)) -> VideoBlock {
        let mut block = VideoBlock::new(UsageKey::parse(VIDEO).unwrap());
        block.display_name = "Intro".to_string();
        configure(&mut block);
        self.blocks.save(&block).await.unwrap();
        block
    }

    pub async fn seed_problem(&self) -> VideoBlock {
        let block = VideoBlock::new(UsageKey::parse(PROBLEM).unwrap());
        self.blocks.save(&block).await.unwrap();
        block
    }

    pub async fn video(&self) -> VideoBlock {
        self.blocks
            .get(&UsageKey::parse(VIDEO).unwrap())
            .await
            .unwrap()
    }

    pub async fn seed_sjson(&self, subs_id: &str, lang: &str, subs: &Sjson) {
        self.transcript_store()
            .save_sjson(&course(), subs_id, lang, subs)
            .await
            .unwrap();
    }

    pub async fn seed_asset(&self, filename: &str, bytes: &[u8]) {
        self.assets
            .save(&course(), filename, "application/x-subrip", bytes.to_vec())
            .await
            .unwrap();
    }

    pub async fn stored_sjson(&self, subs_id: &str, lang: &str) -> Option<Sjson> {
        self.transcript_store()
            .find_sjson(&course(), subs_id, lang)
            .await
            .unwrap()
    }

    pub async fn asset_exists(&self, filename: &str) -> bool {
        self.assets.exists(&course(), filename).await.unwrap()
    }

    /// Multipart upload through the authoring endpoint.
    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        body: &str,
        videos: Value,
        language: Option<&str>,
    ) -> reqwest::Response {
        let file = reqwest::multipart::Part::bytes(body.as_bytes().to_vec())
            .file_name(filename.to_string());
        let mut form = reqwest::multipart::Form::new()
            .text("locator", VIDEO)
            .text("video_list", videos.to_string())
            .part("transcript-file", file);
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }
        self.auth_post("/api/transcripts/upload", token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    /// `GET /api/transcripts/check` for [`VIDEO`] with the given sources.
    pub async fn check(&self, token: &str, locator: &str, videos: Value) -> reqwest::Response {
        let data = serde_json::json!({ "locator": locator, "videos": videos });
        self.auth_get("/api/transcripts/check", token)
            .query(&[("data", data.to_string())])
            .send()
            .await
            .unwrap()
    }

    /// Learner path for [`VIDEO`]; `rest` starts after `transcript/`.
    pub fn video_path(&self, rest: &str) -> String {
        self.url(&format!("/api/video/{}/transcript/{}", VIDEO, rest))
    }
}
