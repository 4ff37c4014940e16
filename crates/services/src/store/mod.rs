//! Narrow interfaces consumed from the host's asset store and block store.

pub mod memory;

use async_trait::async_trait;
use lectern_db::{
    CourseKey, UsageKey,
    models::{StoredAsset, VideoBlock},
};

use crate::dao::base::{DaoError, DaoResult};

pub use memory::{MemoryAssetStore, MemoryBlockStore};

/// Opaque blob store keyed by course and filename. Content is never interpreted.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Create-or-replace; a subsequent `find` returns the new bytes.
    async fn save(
        &self,
        course_key: &CourseKey,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> DaoResult<()>;

    async fn find(&self, course_key: &CourseKey, filename: &str) -> DaoResult<StoredAsset>;

    /// Succeeds when the asset is already absent. Returns whether something was removed.
    async fn delete(&self, course_key: &CourseKey, filename: &str) -> DaoResult<bool>;

    async fn exists(&self, course_key: &CourseKey, filename: &str) -> DaoResult<bool> {
        match self.find(course_key, filename).await {
            Ok(_) => Ok(true),
            Err(DaoError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Persistence for video blocks, keyed by location.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn get(&self, location: &UsageKey) -> DaoResult<VideoBlock>;

    async fn save(&self, block: &VideoBlock) -> DaoResult<()>;
}
