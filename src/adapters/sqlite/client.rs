//! SQLite store implementation
//!
//! One connection, shared behind an async mutex. A session holds the lock for
//! its whole lifetime, so sessions never interleave.

use crate::adapters::database::traits::{SessionMode, StoreSession, TableCounts, VisitStore};
use crate::adapters::sqlite::session::SqliteSession;
use crate::config::schema::SqliteConfig;
use crate::domain::{DatabaseError, Result};
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Schema applied by [`VisitStore::ensure_schema`]
const MIGRATION_SQL: &str = include_str!("../../../migrations/sqlite/001_initial_schema.sql");

/// Path value that selects a private in-memory database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// SQLite-backed [`VisitStore`]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl SqliteStore {
    /// Open (or create) the database file named in the configuration
    ///
    /// Missing parent directories are created. `":memory:"` opens a private
    /// in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Unavailable` if the file cannot be opened.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let conn = if config.path == IN_MEMORY_PATH {
            Connection::open_in_memory().map_err(map_sqlite_error)?
        } else {
            let path = Path::new(&config.path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Unavailable(format!(
                            "Failed to create directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            Connection::open(path).map_err(map_sqlite_error)?
        };

        configure_connection(&conn, Duration::from_millis(config.busy_timeout_ms))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: config.path.clone(),
        })
    }

    /// Open an in-memory store with the schema applied (for tests and dry runs)
    pub async fn open_in_memory() -> Result<Self> {
        let store = Self::open(&SqliteConfig {
            path: IN_MEMORY_PATH.to_string(),
            busy_timeout_ms: 0,
        })?;
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Path the store was opened with
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .map_err(map_sqlite_error)?;
    conn.busy_timeout(busy_timeout).map_err(map_sqlite_error)?;
    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .map_err(map_sqlite_error)?;
    Ok(count.max(0) as u64)
}

#[async_trait]
impl VisitStore for SqliteStore {
    async fn test_connection(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(map_sqlite_error)?;
        tracing::debug!(path = %self.path, "SQLite connection test successful");
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(MIGRATION_SQL)
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        tracing::info!(path = %self.path, "SQLite schema initialized");
        Ok(())
    }

    async fn begin(&self, mode: SessionMode) -> Result<Box<dyn StoreSession>> {
        let guard = self.conn.clone().lock_owned().await;
        let session = SqliteSession::begin(guard, mode)?;
        Ok(Box::new(session))
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.conn.lock().await;
        Ok(TableCounts {
            clients: count_rows(&conn, "Clients")?,
            providers: count_rows(&conn, "Providers")?,
            billables: count_rows(&conn, "Billables")?,
            visits: count_rows(&conn, "Visits")?,
            visit_details: count_rows(&conn, "VisitDetails")?,
            visit_images: count_rows(&conn, "VisitImages")?,
        })
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// Translate a driver error into the domain error
pub(crate) fn map_sqlite_error(err: rusqlite::Error) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => DatabaseError::ConstraintViolation(err.to_string()),
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase => DatabaseError::Unavailable(err.to_string()),
            _ => DatabaseError::QueryFailed(err.to_string()),
        },
        _ => DatabaseError::QueryFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_in_memory_applies_schema() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let counts = store.table_counts().await.unwrap();
        assert_eq!(counts, TableCounts::default());
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("practice.sqlite");
        let store = SqliteStore::open(&SqliteConfig {
            path: path.to_string_lossy().to_string(),
            busy_timeout_ms: 100,
        })
        .unwrap();
        store.ensure_schema().await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_constraint_errors_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .unwrap();
        conn.execute("INSERT INTO t (id) VALUES (1)", []).unwrap();
        let err = conn.execute("INSERT INTO t (id) VALUES (1)", []).unwrap_err();
        assert!(matches!(
            map_sqlite_error(err),
            DatabaseError::ConstraintViolation(_)
        ));

        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();
        assert!(matches!(map_sqlite_error(err), DatabaseError::QueryFailed(_)));
    }
}
