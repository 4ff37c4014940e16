pub mod auth;
pub mod dao;
pub mod store;
pub mod transcripts;

pub use auth::{AuthService, Claims};
pub use dao::*;
pub use store::{AssetStore, BlockStore, MemoryAssetStore, MemoryBlockStore};
pub use transcripts::{TranscriptError, TranscriptService};
