pub mod asset;
pub mod video_block;

pub use asset::StoredAsset;
pub use video_block::{VideoBlock, VideoBlockPatch};
