//! Database layer for the Grouper connector.
//!
//! - [`SqlConnection`] is the only thing the engine needs from a database:
//!   run a SELECT, get rows of named columns back
//! - [`DuckDbConnection`] implements it on an embedded DuckDB database
//! - [`RowMaterializer`] folds joined rows into [`grouper_model::GrouperObject`]s
//! - [`StorageError`] carries database failures classified by SQLSTATE into
//!   an [`ErrorKind`]

mod connection;
mod duckdb_connection;
mod error;
mod materializer;

pub use connection::{Row, SqlConnection, SqlValue};
pub use duckdb_connection::{DuckDbConnection, open_duckdb_with_wal_recovery};
pub use error::{DbError, ErrorKind, StorageError, StorageResult};
pub use materializer::{ObjectMap, RowContribution, RowMaterializer};
