pub mod asset;
pub mod base;
pub mod video_block;

pub use asset::AssetDao;
pub use base::{BaseDao, DaoError, DaoResult};
pub use video_block::VideoBlockDao;
