use async_trait::async_trait;
use dashmap::DashMap;
use lectern_db::{
    CourseKey, UsageKey,
    models::{StoredAsset, VideoBlock},
};
use tracing::debug;

use super::{AssetStore, BlockStore};
use crate::dao::base::{DaoError, DaoResult};

/// Process-local asset store. Keys are the static-content asset ids.
#[derive(Default)]
pub struct MemoryAssetStore {
    assets: DashMap<String, StoredAsset>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn save(
        &self,
        course_key: &CourseKey,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> DaoResult<()> {
        let asset = StoredAsset::new(course_key, filename, content_type, bytes);
        debug!(course = %course_key, filename, size = asset.length, "Saved asset");
        self.assets.insert(asset.id.clone(), asset);
        Ok(())
    }

    async fn find(&self, course_key: &CourseKey, filename: &str) -> DaoResult<StoredAsset> {
        self.assets
            .get(&course_key.asset_key(filename))
            .map(|entry| entry.value().clone())
            .ok_or(DaoError::NotFound)
    }

    async fn delete(&self, course_key: &CourseKey, filename: &str) -> DaoResult<bool> {
        Ok(self.assets.remove(&course_key.asset_key(filename)).is_some())
    }
}

#[derive(Default)]
pub struct MemoryBlockStore {
    blocks: DashMap<String, VideoBlock>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn get(&self, location: &UsageKey) -> DaoResult<VideoBlock> {
        self.blocks
            .get(&location.to_string())
            .map(|entry| entry.value().clone())
            .ok_or(DaoError::NotFound)
    }

    async fn save(&self, block: &VideoBlock) -> DaoResult<()> {
        self.blocks.insert(block.location.to_string(), block.clone());
        Ok(())
    }
}
