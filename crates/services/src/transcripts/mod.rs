//! Video transcript subsystem: formats, storage conventions, caption fetching and the
//! authoring/learner operations built on top of them.

pub mod codec;
pub mod filenames;
pub mod presence;
pub mod service;
pub mod sjson;
pub mod speed;
pub mod store;
pub mod youtube;

use std::sync::Arc;

use chrono::{DateTime, Local};
use lectern_db::{CourseKey, KeyError};
use thiserror::Error;

use crate::dao::DaoError;
use crate::store::{AssetStore, BlockStore};

pub use codec::{CodecError, TranscriptFormat};
pub use presence::{Command, PresenceRecord, VideoSource};
pub use service::{TranscriptFile, TranscriptService, TranslationOutcome};
pub use sjson::Sjson;
pub use store::TranscriptStore;
pub use youtube::{CaptionSource, FetchError, YoutubeFetcher};

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Codec(CodecError),
    #[error(transparent)]
    ExternalFetch(#[from] FetchError),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("Storage error: {0}")]
    Store(DaoError),
}

pub type TranscriptResult<T> = Result<T, TranscriptError>;

impl From<CodecError> for TranscriptError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidSpeed(_) => Self::Validation(err.to_string()),
            other => Self::Codec(other),
        }
    }
}

impl From<DaoError> for TranscriptError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => Self::NotFound(err.to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<KeyError> for TranscriptError {
    fn from(_: KeyError) -> Self {
        Self::Validation("Cannot find item by locator.".to_string())
    }
}

/// Authorization predicate supplied by the host for authoring operations.
pub trait CourseAccess: Send + Sync {
    fn can_edit(&self, course_key: &CourseKey) -> bool;
}

/// Grants every course. Used by operator tooling.
pub struct Unrestricted;

impl CourseAccess for Unrestricted {
    fn can_edit(&self, _course_key: &CourseKey) -> bool {
        true
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Collaborators handed to [`TranscriptService`] at construction.
#[derive(Clone)]
pub struct Services {
    pub assets: Arc<dyn AssetStore>,
    pub blocks: Arc<dyn BlockStore>,
    pub captions: Arc<dyn CaptionSource>,
    pub clock: Arc<dyn Clock>,
}
