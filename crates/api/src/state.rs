use std::sync::Arc;

use lectern_config::{Settings, StorageBackend};
use lectern_db::{connect, indexes::ensure_indexes};
use lectern_services::{
    AuthService,
    dao::{AssetDao, VideoBlockDao},
    store::{MemoryAssetStore, MemoryBlockStore},
    transcripts::{Services, SystemClock, TranscriptService, YoutubeFetcher},
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub transcripts: Arc<TranscriptService>,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let services = build_services(&settings).await?;
        Ok(Self::with_services(settings, services))
    }

    pub fn with_services(settings: Settings, services: Services) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let transcripts = Arc::new(TranscriptService::new(services, &settings.transcripts));

        Self {
            settings,
            auth,
            transcripts,
        }
    }
}

/// Wires the configured storage backend and the YouTube client.
pub async fn build_services(settings: &Settings) -> anyhow::Result<Services> {
    let captions = Arc::new(YoutubeFetcher::new(settings.youtube.clone())?);

    let services = match settings.storage.backend {
        StorageBackend::Mongo => {
            let db = connect(&settings.database).await?;
            ensure_indexes(&db).await?;
            info!(database = %settings.database.name, "Using MongoDB transcript storage");
            Services {
                assets: Arc::new(AssetDao::new(&db)),
                blocks: Arc::new(VideoBlockDao::new(&db)),
                captions,
                clock: Arc::new(SystemClock),
            }
        }
        StorageBackend::Memory => {
            info!("Using in-memory transcript storage");
            Services {
                assets: Arc::new(MemoryAssetStore::new()),
                blocks: Arc::new(MemoryBlockStore::new()),
                captions,
                clock: Arc::new(SystemClock),
            }
        }
    };
    Ok(services)
}
