//! The database seam.

use std::sync::Arc;
use std::time::{Duration, Instant};

use grouper_model::Scalar;
use tracing::debug;

use crate::error::DbError;

/// One value of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
}

impl SqlValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view. Text is parsed, anything else is `None`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null | Self::Boolean(_) | Self::Double(_) => None,
        }
    }

    /// Text view. Numbers are stringified, NULL is `None`.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Boolean(b) => Some(b.to_string()),
            Self::Integer(v) => Some(v.to_string()),
            Self::Double(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Attribute value with numbers stringified.
    #[must_use]
    pub fn to_text_scalar(&self) -> Option<Scalar> {
        self.as_text().map(Scalar::Text)
    }
}

/// A result row: named columns in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Builds a row. Rows of one result share their column names.
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Builds a row from `(column, value)` pairs.
    #[must_use]
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, SqlValue)>) -> Self {
        let (columns, values): (Vec<String>, Vec<SqlValue>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Value of the named column.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns.iter().position(|c| c == column).and_then(|i| self.values.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// A database connection able to run SELECT statements.
///
/// The engine only borrows the connection; opening and closing it is the
/// caller's business.
pub trait SqlConnection {
    /// Runs a statement and returns every row.
    fn query(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Checks that the connection answers a probe statement within
    /// `timeout`. A probe that succeeds too late counts as invalid.
    fn is_valid(&self, timeout: Duration) -> bool {
        let started = Instant::now();
        let answered = self.query("SELECT 1").is_ok();
        let elapsed = started.elapsed();
        if answered && elapsed > timeout {
            debug!(?elapsed, ?timeout, "validity probe answered too late");
            return false;
        }
        answered
    }
}

impl<T: SqlConnection + ?Sized> SqlConnection for &T {
    fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        (**self).query(sql)
    }

    fn is_valid(&self, timeout: Duration) -> bool {
        (**self).is_valid(timeout)
    }
}
