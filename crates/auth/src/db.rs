//! SQLite connection pool
//!
//! Identity and care records share one database. The pool is opened here
//! and handed to every store.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::{AuthError, Result};

/// How long a writer waits for the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open or create a file-backed database
///
/// Creates parent directories when needed and enables WAL journaling.
pub async fn open_pool<P: AsRef<Path>>(path: P, max_connections: u32) -> Result<SqlitePool> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AuthError::DatabaseError(format!(
                "failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to open database: {}", e)))?;

    info!(path = %path.display(), max_connections, "database opened");
    Ok(pool)
}

/// Create an in-memory database
///
/// Uses a single connection that is never recycled, so every query sees
/// the same database.
pub async fn memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AuthError::DatabaseError(format!("invalid memory db options: {}", e)))?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("failed to create memory db: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_is_shared() {
        let pool = memory_pool().await.unwrap();
        sqlx::query("CREATE TABLE t (x INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_open_pool_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mediguard.db");
        let pool = open_pool(&path, 2).await.unwrap();
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        assert!(path.exists());
    }
}
