//! SQL generation for the Grouper connector.
//!
//! Two pieces:
//! - [`FilterTranslator`] turns a [`grouper_model::Filter`] tree into a WHERE
//!   fragment against the tables of a [`grouper_model::TableSchema`]
//! - [`QueryBuilder`] assembles the complete SELECT: projection, joins,
//!   filter, paging, identifier batches, grouping for watermark queries and
//!   the COUNT wrapper
//!
//! The generated SQL uses PostgreSQL syntax (`GREATEST`, `::TEXT`,
//! `LIMIT`/`OFFSET`), which DuckDB accepts unchanged.

mod builder;
mod error;
mod options;
mod resource_query;
mod translator;

pub use builder::{JoinKind, QueryBuilder};
pub use error::{QueryError, QueryResult};
pub use options::OperationOptions;
pub use resource_query::ResourceQuery;
pub use translator::{FilterTranslator, sql_literal};
