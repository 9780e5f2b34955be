//! libSQL backend: async `SlotStorage` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::error::StorageError;
use crate::store::migrations;
use crate::store::traits::SlotStorage;

/// libSQL slot storage.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStorage {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStorage {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to open libSQL database: {e}")))?;

        let storage = Self::from_database(db)?;
        migrations::run_migrations(&storage.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(storage)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to create in-memory database: {e}"))
            })?;

        let storage = Self::from_database(db)?;
        migrations::run_migrations(&storage.conn).await?;
        Ok(storage)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Unavailable(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

#[async_trait]
impl SlotStorage for LibSqlStorage {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn get_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut rows = self
            .conn
            .query("SELECT value FROM slots WHERE key = ?1", params![key])
            .await
            .map_err(|e| storage_error("get_slot", e))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| storage_error("get_slot", e))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(storage_error("get_slot", e)),
        }
    }

    async fn set_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )
            .await
            .map_err(|e| storage_error("set_slot", e))?;
        Ok(())
    }

    async fn remove_slot(&self, key: &str) -> Result<bool, StorageError> {
        let count = self
            .conn
            .execute("DELETE FROM slots WHERE key = ?1", params![key])
            .await
            .map_err(|e| storage_error("remove_slot", e))?;
        Ok(count > 0)
    }
}

/// Primary SQLite result codes that mean the database file itself is gone
/// or cannot take writes.
const SQLITE_READONLY: i32 = 8;
const SQLITE_IOERR: i32 = 10;
const SQLITE_FULL: i32 = 13;
const SQLITE_CANTOPEN: i32 = 14;

/// Tag a libSQL error with the operation name. Failures of the database file
/// map to `Unavailable`; everything else is a query error.
fn storage_error(op: &str, e: libsql::Error) -> StorageError {
    let file_failure = match &e {
        libsql::Error::SqliteFailure(code, _) => matches!(
            code & 0xff,
            SQLITE_READONLY | SQLITE_IOERR | SQLITE_FULL | SQLITE_CANTOPEN
        ),
        _ => false,
    };
    if file_failure {
        StorageError::Unavailable(format!("{op}: {e}"))
    } else {
        StorageError::Query(format!("{op}: {e}"))
    }
}
