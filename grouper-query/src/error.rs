//! Error types for query construction.

use thiserror::Error;

/// Result type for query construction.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while translating a filter or building a statement.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No table in the query carries the attribute's column.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The filter kind is recognized but not supported.
    #[error("filter not implemented: {0}")]
    NotImplemented(&'static str),

    /// A filter value is missing, ambiguous or does not fit its column.
    #[error("invalid value for {attribute}: {reason}")]
    InvalidValue { attribute: String, reason: String },

    /// The primary table is not part of the table schema.
    #[error("primary table {0} is missing from the query schema")]
    MissingTable(String),

    /// An identifier batch with no identifiers.
    #[error("identifier batch is empty")]
    EmptyIdentifierSet,

    /// Paging options that do not describe a page.
    #[error("inconsistent paging options: {0}")]
    InconsistentPaging(String),
}
