use async_trait::async_trait;
use bson::doc;
use lectern_db::{CourseKey, models::StoredAsset};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::AssetStore;

pub struct AssetDao {
    pub base: BaseDao<StoredAsset>,
}

impl AssetDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, StoredAsset::COLLECTION),
        }
    }
}

#[async_trait]
impl AssetStore for AssetDao {
    async fn save(
        &self,
        course_key: &CourseKey,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> DaoResult<()> {
        let asset = StoredAsset::new(course_key, filename, content_type, bytes);
        self.base.upsert(doc! { "_id": &asset.id }, &asset).await
    }

    async fn find(&self, course_key: &CourseKey, filename: &str) -> DaoResult<StoredAsset> {
        self.base
            .get_one(doc! { "_id": course_key.asset_key(filename) })
            .await
    }

    async fn delete(&self, course_key: &CourseKey, filename: &str) -> DaoResult<bool> {
        let deleted = self
            .base
            .hard_delete(doc! { "_id": course_key.asset_key(filename) })
            .await?;
        Ok(deleted > 0)
    }

    async fn exists(&self, course_key: &CourseKey, filename: &str) -> DaoResult<bool> {
        let count = self
            .base
            .count(doc! { "_id": course_key.asset_key(filename) })
            .await?;
        Ok(count > 0)
    }
}
