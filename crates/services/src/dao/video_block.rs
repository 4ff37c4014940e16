use async_trait::async_trait;
use bson::doc;
use lectern_db::{UsageKey, models::VideoBlock};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::BlockStore;

pub struct VideoBlockDao {
    pub base: BaseDao<VideoBlock>,
}

impl VideoBlockDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, VideoBlock::COLLECTION),
        }
    }
}

#[async_trait]
impl BlockStore for VideoBlockDao {
    async fn get(&self, location: &UsageKey) -> DaoResult<VideoBlock> {
        self.base
            .get_one(doc! { "location": location.to_string() })
            .await
    }

    async fn save(&self, block: &VideoBlock) -> DaoResult<()> {
        self.base
            .upsert(doc! { "location": block.location.to_string() }, block)
            .await
    }
}
