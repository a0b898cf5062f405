//! Error types for the streaming core
//!
//! Only `Format`, `NotFound` and `InvalidArgument` ever abort a session, and only
//! before streaming begins. Everything else is handled per region.

use thiserror::Error;

/// Convenience Result type using [`StreamError`]
pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum StreamError {
    /// Unsupported or corrupt container; the recording is skipped, never fatal
    #[error("Unsupported audio format: {0}")]
    Format(String),

    /// Unknown recording
    #[error("Recording not found: {0}")]
    NotFound(String),

    /// Rejected request (bad offset, bad buffer length, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Play ledger could not load or persist a record
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Blocking or spawned task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<hound::Error> for StreamError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => StreamError::Io(e),
            other => StreamError::Format(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Ledger(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StreamError {
    fn from(err: tokio::task::JoinError) -> Self {
        StreamError::Task(err.to_string())
    }
}

/// A region lock could not be granted within the timeout.
///
/// Not an error for the session: the region is streamed as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Timed out waiting for lock on {recording_id} region {region_index}")]
pub struct LockTimeout {
    pub recording_id: String,
    pub region_index: usize,
}
