//! Connector configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grouper_model::ObjectClassSchema;
use grouper_storage::ErrorKind;
use grouper_sync::ProcessingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("one or more mandatory parameters or combinations of parameters are not set correctly: {}", parameters.join(", "))]
    Invalid { parameters: Vec<String> },

    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Settings of one connector instance, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrouperConfiguration {
    /// DuckDB database file. Only needed when the connector opens the
    /// database itself.
    pub database_path: Option<PathBuf>,
    pub table_prefix: String,
    /// Seconds allowed for the connection check.
    pub connection_valid_timeout: u64,
    pub extended_group_properties: Vec<String>,
    pub extended_subject_properties: Vec<String>,
    pub attrs_to_have_in_all_search: Vec<String>,
    pub exclude_deleted_objects: bool,
    pub enable_id_based_paging: bool,
    pub max_page_size: Option<u64>,
}

impl Default for GrouperConfiguration {
    fn default() -> Self {
        Self {
            database_path: None,
            table_prefix: "gr".to_string(),
            connection_valid_timeout: 10,
            extended_group_properties: Vec::new(),
            extended_subject_properties: Vec::new(),
            attrs_to_have_in_all_search: Vec::new(),
            exclude_deleted_objects: true,
            enable_id_based_paging: false,
            max_page_size: None,
        }
    }
}

impl GrouperConfiguration {
    /// Reads a configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Checks every parameter and reports all offending names at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut parameters = Vec::new();
        if self.table_prefix.trim().is_empty() {
            parameters.push("table_prefix".to_string());
        }
        if self.max_page_size.is_some() && !self.enable_id_based_paging {
            parameters.push("max_page_size".to_string());
            parameters.push("enable_id_based_paging".to_string());
        }
        if self.max_page_size == Some(0) && !parameters.iter().any(|p| p == "max_page_size") {
            parameters.push("max_page_size".to_string());
        }
        if self.exclude_deleted_objects {
            info!("rows marked deleted are left out of searches and objects");
        }
        if parameters.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { parameters })
        }
    }

    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_valid_timeout)
    }

    #[must_use]
    pub fn processing_config(&self) -> ProcessingConfig {
        ProcessingConfig {
            exclude_deleted_objects: self.exclude_deleted_objects,
            enable_id_based_paging: self.enable_id_based_paging,
            max_page_size: self.max_page_size,
            attrs_to_have_in_all_search: self.attrs_to_have_in_all_search.clone(),
        }
    }

    #[must_use]
    pub fn group_schema(&self) -> ObjectClassSchema {
        ObjectClassSchema::group(&self.table_prefix, self.extended_group_properties.clone())
    }

    #[must_use]
    pub fn subject_schema(&self) -> ObjectClassSchema {
        ObjectClassSchema::subject(&self.table_prefix, self.extended_subject_properties.clone())
    }
}
