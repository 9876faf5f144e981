//! Object kinds exposed by the connector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The object classes a caller can search or synchronize.
///
/// `All` only exists for synchronization: it merges the group and subject
/// change streams into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Group,
    Subject,
    All,
}

impl ObjectKind {
    /// Returns the lowercase name used in configuration and on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Subject => "subject",
            Self::All => "all",
        }
    }

    /// Returns true for the kinds backed by a table of their own.
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !matches!(self, Self::All)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "group" => Ok(Self::Group),
            "subject" => Ok(Self::Subject),
            "all" | "__all__" => Ok(Self::All),
            other => Err(Error::InvalidObjectKind(other.to_string())),
        }
    }
}
