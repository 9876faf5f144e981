//! The connector facade tying configuration, database and engines together.

use std::collections::BTreeSet;

use grouper_model::columns::ATTRIBUTE_NAME;
use grouper_model::{AttributeInfo, Filter, ObjectClassSchema};
use grouper_query::{OperationOptions, QueryBuilder, QueryError};
use grouper_storage::{DuckDbConnection, ErrorKind, SqlConnection, SqlValue, StorageError};
use grouper_sync::{
    ProcessingConfig, ResultsHandler, SearchEngine, SearchResult, SyncEngine, SyncError,
    SyncResultsHandler, SyncSummary,
};
use grouper_types::{ObjectKind, SyncToken};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, GrouperConfiguration};

/// Rows read from an extension table when discovering attribute names.
const DISCOVERY_ROW_LIMIT: u64 = 1000;

pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("connection test failed: {0}")]
    ConnectionTest(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl ConnectorError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(e) => e.kind(),
            Self::Storage(e) => e.kind(),
            Self::Sync(e) => e.kind(),
            Self::ConnectionTest(_) => ErrorKind::ConnectionFailed,
            Self::Query(_) | Self::Unsupported(_) => ErrorKind::Connector,
        }
    }
}

/// Attributes of one object class, as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectClassInfo {
    pub kind: ObjectKind,
    pub attributes: Vec<AttributeInfo>,
}

/// A configured connector over one database connection.
pub struct GrouperConnector<C: SqlConnection = DuckDbConnection> {
    config: GrouperConfiguration,
    processing: ProcessingConfig,
    groups: ObjectClassSchema,
    subjects: ObjectClassSchema,
    connection: C,
}

impl GrouperConnector<DuckDbConnection> {
    /// Validates the configuration and opens its database file.
    pub fn open(config: GrouperConfiguration) -> ConnectorResult<Self> {
        let Some(path) = config.database_path.clone() else {
            return Err(ConfigError::Invalid {
                parameters: vec!["database_path".to_string()],
            }
            .into());
        };
        config.validate()?;
        info!(path = %path.display(), "opening database");
        let connection = DuckDbConnection::open(&path)?;
        Self::with_connection(config, connection)
    }
}

impl<C: SqlConnection> GrouperConnector<C> {
    /// Validates the configuration and wraps an existing connection.
    pub fn with_connection(config: GrouperConfiguration, connection: C) -> ConnectorResult<Self> {
        config.validate()?;
        Ok(Self {
            processing: config.processing_config(),
            groups: config.group_schema(),
            subjects: config.subject_schema(),
            config,
            connection,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GrouperConfiguration {
        &self.config
    }

    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    fn object_schema(&self, kind: ObjectKind) -> ConnectorResult<&ObjectClassSchema> {
        match kind {
            ObjectKind::Group => Ok(&self.groups),
            ObjectKind::Subject => Ok(&self.subjects),
            ObjectKind::All => Err(ConnectorError::Unsupported(format!("no object class for {kind} kinds"))),
        }
    }

    /// Attributes of the group and subject object classes.
    #[must_use]
    pub fn schema(&self) -> Vec<ObjectClassInfo> {
        [&self.groups, &self.subjects]
            .into_iter()
            .map(|s| ObjectClassInfo {
                kind: s.kind(),
                attributes: s.attribute_infos(),
            })
            .collect()
    }

    /// Names present in the extension table of `kind`, sorted.
    pub fn discover_extension_attributes(&self, kind: ObjectKind) -> ConnectorResult<Vec<String>> {
        let schema = self.object_schema(kind)?;
        let sql = QueryBuilder::select_all(schema.extension_table(), DISCOVERY_ROW_LIMIT).build()?;
        let rows = self
            .connection
            .query(&sql)
            .map_err(|e| StorageError::database(e, format!("discovering {kind} attributes")))?;
        let names: BTreeSet<String> = rows
            .iter()
            .filter_map(|row| row.value(ATTRIBUTE_NAME).and_then(SqlValue::as_text))
            .collect();
        debug!(%kind, count = names.len(), "discovered extension attributes");
        Ok(names.into_iter().collect())
    }

    /// Checks the configuration and that the database answers.
    pub fn test(&self) -> ConnectorResult<()> {
        info!("testing connection");
        self.config.validate()?;
        if !self.connection.is_valid(self.config.connection_timeout()) {
            return Err(ConnectorError::ConnectionTest("connection is not valid".into()));
        }
        self.connection
            .query("SELECT 1")
            .map_err(|e| ConnectorError::ConnectionTest(e.to_string()))?;
        Ok(())
    }

    pub fn search(
        &self,
        kind: ObjectKind,
        filter: Option<&Filter>,
        options: &OperationOptions,
        handler: &mut dyn ResultsHandler,
    ) -> ConnectorResult<SearchResult> {
        let engine = SearchEngine::new(&self.processing, &self.groups, &self.subjects);
        Ok(engine.search(&self.connection, kind, filter, options, handler)?)
    }

    pub fn sync(
        &self,
        kind: ObjectKind,
        token: Option<SyncToken>,
        options: &OperationOptions,
        handler: &mut dyn SyncResultsHandler,
    ) -> ConnectorResult<SyncSummary> {
        let engine = SyncEngine::new(&self.processing, &self.groups, &self.subjects);
        Ok(engine.sync(&self.connection, kind, token, options, handler)?)
    }

    pub fn latest_sync_token(&self, kind: ObjectKind) -> ConnectorResult<Option<SyncToken>> {
        let engine = SyncEngine::new(&self.processing, &self.groups, &self.subjects);
        Ok(engine.latest_sync_token(&self.connection, kind)?)
    }
}
