use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{StoredAsset, VideoBlock};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Transcript assets: one blob per (course, filename)
    create_indexes(
        db,
        StoredAsset::COLLECTION,
        vec![
            index_unique(bson::doc! { "course_key": 1, "filename": 1 }),
            index(bson::doc! { "course_key": 1, "content_type": 1 }),
        ],
    )
    .await?;

    // Video blocks
    create_indexes(
        db,
        VideoBlock::COLLECTION,
        vec![
            index_unique(bson::doc! { "location": 1 }),
            index(bson::doc! { "course_key": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
