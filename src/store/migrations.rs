//! Versioned schema for the libSQL slot backend.
//!
//! Versions are recorded in `_migrations`. Each pending version is applied
//! together with its record in one transaction, so a crash mid-migration
//! leaves the previous version in place.

use libsql::Connection;
use tracing::{debug, info};

use crate::error::StorageError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Append only.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "slots",
    sql: "CREATE TABLE IF NOT EXISTS slots (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL
          );",
}];

/// Latest schema version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Bring the schema up to [`latest_version`].
pub async fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .await
    .map_err(|e| StorageError::Migration(format!("create _migrations: {e}")))?;

    let current = schema_version(conn).await?;
    if current > latest_version() {
        return Err(StorageError::Migration(format!(
            "database is at schema V{current}, newer than this build (V{})",
            latest_version()
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(conn, migration).await?;
    }
    debug!(version = latest_version(), "Slot schema up to date");
    Ok(())
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<(), StorageError> {
    let failed = |e: libsql::Error| {
        StorageError::Migration(format!("V{} ({}): {e}", migration.version, migration.name))
    };

    info!(version = migration.version, name = migration.name, "Applying migration");
    let tx = conn.transaction().await.map_err(failed)?;
    tx.execute_batch(migration.sql).await.map_err(failed)?;
    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![migration.version, migration.name],
    )
    .await
    .map_err(failed)?;
    tx.commit().await.map_err(failed)
}

/// Highest applied version, 0 for a fresh database.
pub async fn schema_version(conn: &Connection) -> Result<i64, StorageError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| StorageError::Migration(format!("schema_version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| StorageError::Migration(format!("schema_version: {e}")))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| StorageError::Migration(format!("schema_version: {e}"))),
        None => Ok(0),
    }
}
