//! SQLite connection pools for the run store.
//!
//! SQLite serializes writers, so the pool is split: a single-connection
//! writer pool keeps write serialization explicit, and a multi-connection
//! reader pool lets status and list queries proceed concurrently. Both run
//! in WAL mode so readers never block the writer.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Split read/write pool wrapper.
#[derive(Clone)]
pub struct DatabasePool {
    /// Up to 8 connections, read-only.
    pub reader: SqlitePool,
    /// Exactly one connection; all writes go through here.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database at `database_url` and run
    /// pending migrations.
    ///
    /// Migrations run on the writer before the reader pool opens, so readers
    /// always see a current schema.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_pool(name: &str) -> (tempfile::TempDir, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join(name).display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_migrations_create_runs_table() {
        let (_dir, pool) = open_pool("test.db").await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        assert!(tables.iter().any(|t| t.0 == "runs"), "runs table missing");
    }

    #[tokio::test]
    async fn test_pool_uses_wal_mode() {
        let (_dir, pool) = open_pool("test_wal.db").await;

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(mode.0.to_lowercase(), "wal");
    }
}
