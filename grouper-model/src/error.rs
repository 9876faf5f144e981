//! Error types for the model layer.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building logical objects or schemas.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An object's identifier is immutable once set.
    #[error("identifier already set to {existing}, refusing {attempted}")]
    IdentifierMismatch { existing: String, attempted: String },

    /// The combined kind has no tables of its own.
    #[error("object kind {0} has no table schema")]
    NoSchemaForKind(grouper_types::ObjectKind),
}
