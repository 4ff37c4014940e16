//! Caption retrieval from YouTube.
//!
//! Two pathways are tried in order: caption-track discovery on the watch page,
//! then the legacy timed-text endpoint. Both end in the same timed-text XML.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use lectern_config::YoutubeSettings;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::codec::unescape_html;
use super::sjson::Sjson;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Can't receive transcripts from Youtube for {video_id}: {source}")]
    Http {
        video_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Can't receive transcripts from Youtube for {video_id}. Status code: {status}.")]
    Status { video_id: String, status: u16 },
    #[error("Can't get transcript link from Youtube for {video_id}.")]
    NoCaptions { video_id: String },
    #[error("Malformed caption data from Youtube for {video_id}: {reason}")]
    Malformed { video_id: String, reason: String },
    #[error("Youtube returned an empty transcript for {video_id}.")]
    Empty { video_id: String },
    #[error("Invalid Youtube client configuration: {0}")]
    Config(String),
}

impl FetchError {
    /// Network failures and server-side errors are worth another attempt.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request() || source.is_body()
            }
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Anything able to produce the captions of a remote video in a given language.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<Sjson, FetchError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(rename = "languageCode")]
    pub language_code: Option<String>,
}

/// Finds the `captionTracks` array in a watch page.
pub fn extract_caption_tracks(
    video_id: &str,
    html: &str,
    caption_re: &Regex,
) -> Result<Vec<CaptionTrack>, FetchError> {
    let Some(group) = caption_re
        .captures(html)
        .and_then(|caps| caps.name("caption_tracks"))
    else {
        return Err(FetchError::NoCaptions {
            video_id: video_id.to_string(),
        });
    };
    serde_json::from_str(&format!("[{}]", group.as_str())).map_err(|e| FetchError::Malformed {
        video_id: video_id.to_string(),
        reason: e.to_string(),
    })
}

/// Link of the track for `lang`, with `&` escapes turned back into `&`.
pub fn caption_link(tracks: &[CaptionTrack], lang: &str) -> Option<String> {
    tracks
        .iter()
        .filter(|t| t.language_code.as_deref().is_some_and(|c| c != "None"))
        .find(|t| t.language_code.as_deref() == Some(lang))
        .and_then(|t| t.base_url.as_deref())
        .map(|url| url.replace("\\u0026", "&"))
}

static TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("timed-text pattern")
});
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)""#).expect("attribute pattern"));

fn seconds_attr(attrs: &str, name: &str) -> Option<Result<f64, String>> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|c| &c[1] == name)
        .map(|c| {
            c[2].trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| format!("bad {name} value {:?}", &c[2]))
        })
}

/// Parses `<text start=".." dur="..">..</text>` entries. Times are seconds; `dur` is optional.
/// Entries without text are dropped; whitespace inside text is collapsed.
pub fn parse_timedtext_xml(xml: &str) -> Result<Sjson, String> {
    if !xml.contains("<transcript") && !xml.contains("<text") {
        return Err("not a timed-text document".to_string());
    }
    let mut sjson = Sjson::default();
    for (index, caps) in TEXT_RE.captures_iter(xml).enumerate() {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let start = seconds_attr(attrs, "start")
            .ok_or_else(|| format!("entry {index} has no start"))??;
        let dur = seconds_attr(attrs, "dur").transpose()?.unwrap_or(0.0);

        let raw = caps.get(2).map_or("", |m| m.as_str());
        let text = unescape_html(raw)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }
        sjson.push(
            (start * 1000.0).round() as u64,
            ((start + dur) * 1000.0).round() as u64,
            text,
        );
    }
    Ok(sjson)
}

pub struct YoutubeFetcher {
    client: reqwest::Client,
    settings: YoutubeSettings,
    caption_re: Regex,
}

impl YoutubeFetcher {
    pub fn new(settings: YoutubeSettings) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs));
        if let Some(proxy) = settings.proxy.as_deref().filter(|p| !p.is_empty()) {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| FetchError::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;
        let caption_re = Regex::new(&settings.caption_tracks_regex)
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            caption_re,
        })
    }

    async fn get_once(
        &self,
        video_id: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let http = |source| FetchError::Http {
            video_id: video_id.to_string(),
            source,
        };
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(http)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                video_id: video_id.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(http)
    }

    /// GET with exponential backoff on retriable failures.
    async fn get_with_retries(
        &self,
        video_id: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.get_once(video_id, url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retriable() && attempt < self.settings.max_retries => {
                    let delay = self.settings.backoff_base_ms.saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    warn!(video_id, attempt, delay_ms = delay, error = %e, "Caption request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    warn!(video_id, attempt, error = %e, "Caption request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_timedtext(&self, video_id: &str, url: &str, query: &[(&str, &str)]) -> Result<Sjson, FetchError> {
        let body = self.get_with_retries(video_id, url, query).await?;
        if body.trim().is_empty() {
            return Err(FetchError::Empty {
                video_id: video_id.to_string(),
            });
        }
        let sjson = parse_timedtext_xml(&body).map_err(|reason| FetchError::Malformed {
            video_id: video_id.to_string(),
            reason,
        })?;
        if sjson.is_empty() {
            return Err(FetchError::Empty {
                video_id: video_id.to_string(),
            });
        }
        Ok(sjson)
    }

    pub async fn fetch_via_discovery(&self, video_id: &str, lang: &str) -> Result<Sjson, FetchError> {
        let page_url = format!("{}{}", self.settings.url_base, video_id);
        let html = self.get_with_retries(video_id, &page_url, &[]).await?;
        let tracks = extract_caption_tracks(video_id, &html, &self.caption_re)?;
        let link = caption_link(&tracks, lang).ok_or_else(|| FetchError::NoCaptions {
            video_id: video_id.to_string(),
        })?;
        debug!(video_id, lang, tracks = tracks.len(), "Discovered caption track");
        self.fetch_timedtext(video_id, &link, &[]).await
    }

    pub async fn fetch_via_timedtext_api(&self, video_id: &str, lang: &str) -> Result<Sjson, FetchError> {
        self.fetch_timedtext(
            video_id,
            &self.settings.text_api_url,
            &[("v", video_id), ("lang", lang)],
        )
        .await
    }
}

#[async_trait]
impl CaptionSource for YoutubeFetcher {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<Sjson, FetchError> {
        match self.fetch_via_discovery(video_id, lang).await {
            Ok(sjson) => Ok(sjson),
            Err(e) => {
                warn!(video_id, error = %e, "Caption discovery failed, trying timed-text API");
                self.fetch_via_timedtext_api(video_id, lang).await
            }
        }
    }
}
