use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub jwt: JwtSettings,
    pub youtube: YoutubeSettings,
    pub transcripts: TranscriptSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

/// Caption host endpoints and the HTTP policy used when talking to them.
#[derive(Debug, Deserialize, Clone)]
pub struct YoutubeSettings {
    /// Watch-page prefix; the video id is appended verbatim.
    pub url_base: String,
    /// Legacy timed-text endpoint, queried with `v` and `lang`.
    pub text_api_url: String,
    /// Must expose a `caption_tracks` named group holding the body of the JSON array.
    pub caption_tracks_regex: String,
    pub proxy: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptSettings {
    pub static_url_prefix: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("LECTERN"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "lectern")?
            .set_default("storage.backend", "mongo")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.issuer", "lectern")?
            .set_default("youtube.url_base", "https://www.youtube.com/watch?v=")?
            .set_default("youtube.text_api_url", "https://video.google.com/timedtext")?
            .set_default(
                "youtube.caption_tracks_regex",
                r#"captionTracks\"\:\[(?P<caption_tracks>[^\]]+)"#,
            )?
            .set_default("youtube.proxy", None::<String>)?
            .set_default("youtube.connect_timeout_secs", 10)?
            .set_default("youtube.request_timeout_secs", 30)?
            .set_default("youtube.max_retries", 3)?
            .set_default("youtube.backoff_base_ms", 500)?
            .set_default("transcripts.static_url_prefix", "/static")?
            .set_override_option(
                "youtube.text_api_url",
                std::env::var("YOUTUBE_TEXT_API_URL").ok(),
            )?
            .set_override_option("youtube.proxy", std::env::var("YOUTUBE_PROXY").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
