//! Read-only connector exposing Grouper groups and subjects.
//!
//! [`GrouperConnector`] combines a [`GrouperConfiguration`] with a database
//! connection and offers:
//! - filtered, paged search of groups and subjects
//! - incremental sync from a modification-time token, per kind or for all
//!   kinds merged
//! - the object class schema and extension attribute discovery
//! - a connection test

mod config;
mod connector;

pub use config::{ConfigError, GrouperConfiguration};
pub use connector::{ConnectorError, ConnectorResult, GrouperConnector, ObjectClassInfo};
