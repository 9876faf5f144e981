//! [`SqlConnection`] on an embedded DuckDB database.

use std::path::Path;
use std::sync::Arc;

use duckdb::types::Value;
use tracing::{debug, warn};

use crate::connection::{Row, SqlConnection, SqlValue};
use crate::error::{DbError, StorageError, StorageResult};

/// Open a DuckDB connection with stale WAL recovery.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once. This handles the common case
/// where an unclean shutdown leaves a WAL file that prevents reopening.
pub fn open_duckdb_with_wal_recovery(path: &Path) -> StorageResult<duckdb::Connection> {
    let opened = |p: &Path| {
        duckdb::Connection::open(p)
            .map_err(|e| StorageError::database(e.into(), format!("opening {}", p.display())))
    };
    match duckdb::Connection::open(path) {
        Ok(conn) => Ok(conn),
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                warn!(wal = %wal_path.display(), "DuckDB open failed, removing stale WAL and retrying");
                if std::fs::remove_file(&wal_path).is_ok() {
                    return opened(path);
                }
            }
            Err(StorageError::database(first_err.into(), format!("opening {}", path.display())))
        }
    }
}

/// A DuckDB connection.
pub struct DuckDbConnection {
    conn: duckdb::Connection,
}

impl DuckDbConnection {
    /// Opens (or creates) a database file.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            conn: open_duckdb_with_wal_recovery(path)?,
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| StorageError::database(e.into(), "opening in-memory database"))?;
        Ok(Self { conn })
    }

    /// Runs statements that return no rows (DDL, inserts).
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| StorageError::database(e.into(), "executing batch"))
    }
}

impl From<duckdb::Connection> for DuckDbConnection {
    fn from(conn: duckdb::Connection) -> Self {
        Self { conn }
    }
}

fn convert(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Boolean(b),
        Value::TinyInt(v) => SqlValue::Integer(v.into()),
        Value::SmallInt(v) => SqlValue::Integer(v.into()),
        Value::Int(v) => SqlValue::Integer(v.into()),
        Value::BigInt(v) => SqlValue::Integer(v),
        Value::UTinyInt(v) => SqlValue::Integer(v.into()),
        Value::USmallInt(v) => SqlValue::Integer(v.into()),
        Value::UInt(v) => SqlValue::Integer(v.into()),
        Value::UBigInt(v) => i64::try_from(v).map_or_else(|_| SqlValue::Text(v.to_string()), SqlValue::Integer),
        Value::HugeInt(v) => i64::try_from(v).map_or_else(|_| SqlValue::Text(v.to_string()), SqlValue::Integer),
        Value::Float(v) => SqlValue::Double(v.into()),
        Value::Double(v) => SqlValue::Double(v),
        Value::Text(s) => SqlValue::Text(s),
        other => SqlValue::Text(format!("{other:?}")),
    }
}

impl SqlConnection for DuckDbConnection {
    fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        debug!(sql, "executing query");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        let mut columns: Option<Arc<[String]>> = None;
        while let Some(row) = rows.next()? {
            let names = columns
                .get_or_insert_with(|| {
                    let names: Vec<String> =
                        row.as_ref().column_names().into_iter().map(|n| n.to_string()).collect();
                    names.into()
                })
                .clone();
            let values = (0..names.len())
                .map(|i| row.get::<_, Value>(i).map(convert))
                .collect::<Result<Vec<_>, _>>()?;
            out.push(Row::new(names, values));
        }
        Ok(out)
    }
}
