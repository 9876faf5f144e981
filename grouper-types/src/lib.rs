//! Core type definitions for the Grouper connector.
//!
//! This crate defines the small, engine-agnostic types shared by every layer:
//! - Object kinds (groups, subjects, and the combined kind used by sync)
//! - Sync tokens (modification-time watermarks)

mod kind;
mod token;

pub use kind::ObjectKind;
pub use token::SyncToken;

/// Errors from parsing kinds and tokens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid object kind: {0}")]
    InvalidObjectKind(String),

    #[error("invalid sync token: {0}")]
    InvalidSyncToken(String),
}
