//! Error types for the search and sync layer.

use grouper_storage::{ErrorKind, StorageError};
use grouper_types::ObjectKind;
use thiserror::Error;

/// Result type for search and sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while searching or synchronizing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Database or row folding error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Filter translation or statement building error.
    #[error("query error: {0}")]
    Query(#[from] grouper_query::QueryError),

    /// Object model violation.
    #[error("model error: {0}")]
    Model(#[from] grouper_model::ModelError),

    /// The latest token query returned no row.
    #[error("latest sync token could not be fetched for {0}")]
    LatestTokenUnavailable(ObjectKind),

    /// A change that cannot be turned into a sync delta.
    #[error("invalid change: {0}")]
    InvalidChange(String),

    /// Operation not available for the requested kind.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl SyncError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(e) => e.kind(),
            Self::Query(_)
            | Self::Model(_)
            | Self::LatestTokenUnavailable(_)
            | Self::InvalidChange(_)
            | Self::Unsupported(_) => ErrorKind::Connector,
        }
    }
}
