use std::io;
use thiserror::Error;

/// Error type for the watcher.
///
/// Variants here either stop startup (`ConfigInvalid`, `ToolNotFound`), count as a
/// failed poll cycle (`ListingFailed`), or abort a single entry (`FetchFailed`,
/// `TranscodeFailed`). Best-effort steps use [`SideStepError`] instead.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Playlist listing failed: {0}")]
    ListingFailed(String),

    #[error("Playlist has no entries")]
    EmptyPlaylist,

    #[error("Entry has no identifier: {title}")]
    MissingIdentifier { title: String },

    #[error("Fetch failed for {id}: {stderr}")]
    FetchFailed { id: String, stderr: String },

    #[error("Transcode failed for {id}: {stderr}")]
    TranscodeFailed { id: String, stderr: String },

    #[error("Could not persist download state: {0}")]
    StatePersistFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for the watcher
pub type Result<T> = std::result::Result<T, WatchError>;

impl WatchError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        WatchError::ConfigInvalid(msg.into())
    }

    pub fn listing<S: Into<String>>(msg: S) -> Self {
        WatchError::ListingFailed(msg.into())
    }

    pub fn tool_not_found<S: Into<String>>(msg: S) -> Self {
        WatchError::ToolNotFound(msg.into())
    }

    pub fn fetch<I: Into<String>, S: Into<String>>(id: I, stderr: S) -> Self {
        WatchError::FetchFailed {
            id: id.into(),
            stderr: stderr.into(),
        }
    }

    pub fn transcode<I: Into<String>, S: Into<String>>(id: I, stderr: S) -> Self {
        WatchError::TranscodeFailed {
            id: id.into(),
            stderr: stderr.into(),
        }
    }

    /// True for errors that abort the current entry but leave the cycle running
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            WatchError::MissingIdentifier { .. }
                | WatchError::FetchFailed { .. }
                | WatchError::TranscodeFailed { .. }
        )
    }
}

/// Failure of a best-effort pipeline step.
///
/// The pipeline logs these as warnings and keeps the output file.
#[derive(Error, Debug)]
pub enum SideStepError {
    #[error("Tag write failed: {0}")]
    TagWriteFailed(String),

    #[error("Cover embed failed: {0}")]
    CoverFailed(String),
}

impl SideStepError {
    pub fn tag<S: Into<String>>(msg: S) -> Self {
        SideStepError::TagWriteFailed(msg.into())
    }

    pub fn cover<S: Into<String>>(msg: S) -> Self {
        SideStepError::CoverFailed(msg.into())
    }
}
