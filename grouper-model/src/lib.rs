//! Core model for the Grouper connector.
//!
//! Defines the types every other crate exchanges:
//! - [`GrouperObject`]: a logical group or subject folded from one or more rows
//! - [`Filter`]: the boolean filter tree callers search with
//! - [`TableSchema`] / [`JoinSpec`]: the tables and columns a query touches
//! - [`ObjectClassSchema`]: table and column naming for one object kind,
//!   derived from the configured table prefix

mod error;
mod filter;
mod object;
mod schema;

pub mod columns;

pub use error::{ModelError, ModelResult};
pub use filter::{AttributeName, Filter, FilterAttribute};
pub use object::{AttributeValue, GrouperObject, Scalar};
pub use schema::{AttributeInfo, Column, ColumnType, JoinSpec, ObjectClassSchema, TableSchema};
