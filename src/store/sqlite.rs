//! SQLite-backed implementation of [`Database`].
//!
//! A single `rusqlite::Connection` is shared behind a mutex and every statement
//! runs on tokio's blocking pool, so handlers only ever await.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode, ToSql};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;

use super::{Database, Param, Row};

/// Path value that selects a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// SQLite store holding the `students` and `attendance_records` tables.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// Passing [`MEMORY_PATH`] opens a fresh in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = if path == Path::new(MEMORY_PATH) {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!("Opened SQLite database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a fresh in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(MEMORY_PATH)
    }

    /// Wrap an existing connection, creating or migrating the schema first.
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn).map_err(classify)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Connection("connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<usize, StoreError> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            conn.execute(&sql, params_from_iter(params.iter()))
                .map_err(classify)
        })
        .await
    }

    async fn fetch_one(&self, sql: &str, params: &[Param]) -> Result<Option<Row>, StoreError> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(classify)?;
            let columns = column_names(&stmt);
            let mut rows = stmt.query(params_from_iter(params.iter())).map_err(classify)?;
            let first = match rows.next().map_err(classify)? {
                Some(row) => Some(read_row(row, &columns).map_err(classify)?),
                None => None,
            };
            Ok(first)
        })
        .await
    }

    async fn fetch_all(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, StoreError> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(classify)?;
            let columns = column_names(&stmt);
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| read_row(row, &columns))
                .map_err(classify)?;
            let all = rows.collect::<Result<Vec<_>, _>>().map_err(classify)?;
            Ok(all)
        })
        .await
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Text(value) => value.to_sql(),
            Param::Integer(value) => value.to_sql(),
            Param::Null => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Null)),
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            student_id TEXT PRIMARY KEY,
            student_name TEXT NOT NULL,
            class TEXT NOT NULL,
            qr_code TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_records(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id TEXT NOT NULL,
            student_name TEXT NOT NULL,
            class TEXT NOT NULL,
            attendance_date TEXT NOT NULL,
            attendance_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'present',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(student_id, attendance_date)
        )",
        [],
    )?;

    // Older attendance tables have no status column; every row in them is a presence.
    ensure_attendance_status(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance_records(attendance_date)",
        [],
    )?;

    Ok(())
}

fn ensure_attendance_status(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(attendance_records)")?;
    let columns = stmt
        .query_map([], |r| r.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if !columns.iter().any(|c| c == "status") {
        info!("Adding status column to legacy attendance_records table");
        conn.execute(
            "ALTER TABLE attendance_records ADD COLUMN status TEXT NOT NULL DEFAULT 'present'",
            [],
        )?;
    }
    Ok(())
}

// =============================================================================
// Row and Error Conversion
// =============================================================================

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let mut out = Row::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
        };
        out.insert(name.clone(), value);
    }
    Ok(out)
}

/// Map a rusqlite error onto the store taxonomy.
fn classify(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        let unique = matches!(
            failure.extended_code,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        );
        if failure.code == ErrorCode::ConstraintViolation && unique {
            return StoreError::Conflict(message.clone().unwrap_or_else(|| failure.to_string()));
        }
    }
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::Decode(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}
