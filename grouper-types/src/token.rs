//! Sync tokens.
//!
//! A sync token is the largest modification timestamp (milliseconds) a caller
//! has already seen. Every table row carries a `last_modified` value and the
//! token of an object is the maximum over all of its joined rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A modification-time watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncToken(i64);

impl SyncToken {
    /// The token that precedes every change.
    pub const ZERO: Self = Self(0);

    /// Creates a token from a millisecond timestamp.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond timestamp.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns the later of two optional tokens.
    #[must_use]
    pub fn latest(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

impl From<i64> for SyncToken {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SyncToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| Error::InvalidSyncToken(s.to_string()))
    }
}
