//! Error types for the storage layer.

use std::fmt;

use thiserror::Error;
use tracing::error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A failure reported by the database engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DbError {
    /// Five-character SQLSTATE, when the engine reports one.
    pub sql_state: Option<String>,
    /// Category the engine itself reported, for engines without SQLSTATEs.
    pub engine_kind: Option<ErrorKind>,
    pub message: String,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            sql_state: None,
            engine_kind: None,
            message: message.into(),
        }
    }

    pub fn with_state(sql_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql_state: Some(sql_state.into()),
            ..Self::new(message)
        }
    }

    #[must_use]
    pub fn with_engine_kind(mut self, kind: ErrorKind) -> Self {
        self.engine_kind = Some(kind);
        self
    }

    /// The SQLSTATE classification, falling back to the engine's own
    /// category when the state is missing or unknown.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match (ErrorKind::from_sql_state(self.sql_state.as_deref()), self.engine_kind) {
            (ErrorKind::Connector, Some(kind)) => kind,
            (kind, _) => kind,
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        let message = err.to_string();
        let by_code = match &err {
            duckdb::Error::DuckDBFailure(failure, _) => ErrorKind::from_duckdb_code(failure.code),
            _ => None,
        };
        let kind = by_code.or_else(|| ErrorKind::from_duckdb_message(&message));
        let db = Self::new(message);
        match kind {
            Some(kind) => db.with_engine_kind(kind),
            None => db,
        }
    }
}

/// The error categories callers can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectionFailed,
    InvalidAttributeValue,
    Configuration,
    OperationTimeout,
    PermissionDenied,
    Connector,
}

impl ErrorKind {
    /// Maps a SQLSTATE to its category. Unknown or missing codes are
    /// [`ErrorKind::Connector`].
    #[must_use]
    pub fn from_sql_state(sql_state: Option<&str>) -> Self {
        match sql_state {
            Some("53300" | "HV00N" | "08000" | "08003" | "08006" | "08001" | "08004") => Self::ConnectionFailed,
            Some("HV024") => Self::InvalidAttributeValue,
            Some("53400") => Self::Configuration,
            Some("57P05" | "25P03") => Self::OperationTimeout,
            Some("38004" | "2F004") => Self::PermissionDenied,
            _ => Self::Connector,
        }
    }

    /// Maps a DuckDB result code. Codes without a category give `None`.
    #[must_use]
    pub fn from_duckdb_code(code: duckdb::ffi::ErrorCode) -> Option<Self> {
        use duckdb::ffi::ErrorCode;

        match code {
            ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::SystemIoFailure => Some(Self::ConnectionFailed),
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::OperationInterrupted => {
                Some(Self::OperationTimeout)
            }
            ErrorCode::PermissionDenied | ErrorCode::AuthorizationForStatementDenied | ErrorCode::ReadOnly => {
                Some(Self::PermissionDenied)
            }
            ErrorCode::TypeMismatch | ErrorCode::ParameterOutOfRange => Some(Self::InvalidAttributeValue),
            _ => None,
        }
    }

    /// Maps the exception type DuckDB puts in front of its messages
    /// (`"Conversion Error: ..."`). Other types give `None`.
    #[must_use]
    pub fn from_duckdb_message(message: &str) -> Option<Self> {
        let (prefix, _) = message.split_once(" Error:")?;
        match prefix {
            "IO" | "Connection" | "Network" | "HTTP" => Some(Self::ConnectionFailed),
            "Conversion" | "Invalid Input" | "Out of Range" | "Mismatch Type" => Some(Self::InvalidAttributeValue),
            "Settings" => Some(Self::Configuration),
            "Interrupt" => Some(Self::OperationTimeout),
            "Permission" => Some(Self::PermissionDenied),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectionFailed => "connection failed",
            Self::InvalidAttributeValue => "invalid attribute value",
            Self::Configuration => "configuration error",
            Self::OperationTimeout => "operation timed out",
            Self::PermissionDenied => "permission denied",
            Self::Connector => "connector error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error, classified.
    #[error("{kind} while {context}: {source}")]
    Database {
        kind: ErrorKind,
        context: String,
        #[source]
        source: DbError,
    },

    /// A row that cannot be turned into an object.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Object model violation while folding rows.
    #[error("model error: {0}")]
    Model(#[from] grouper_model::ModelError),
}

impl StorageError {
    /// Classifies a database error and logs it with its context.
    pub fn database(source: DbError, context: impl Into<String>) -> Self {
        let context = context.into();
        let kind = source.kind();
        error!(
            %kind,
            sql_state = source.sql_state.as_deref().unwrap_or("none"),
            message = %source.message,
            "database error while {context}"
        );
        Self::Database { kind, context, source }
    }

    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database { kind, .. } => *kind,
            Self::InvalidData(_) | Self::Model(_) => ErrorKind::Connector,
        }
    }
}
