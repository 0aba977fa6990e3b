use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Migration`] when the schema could not be
    /// created, [`DatabaseError::Other`] for connection failures.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: overlapping ingestion runs contend on the
        // articles table; SQLite waits up to 5 seconds for locks to release
        // before returning SQLITE_BUSY. Connect options apply to every
        // pooled connection, unlike a one-off PRAGMA statement.
        let options = SqliteConnectOptions::from_str(&url)?
            .foreign_keys(true)
            .pragma("busy_timeout", "5000");

        // Each new connection to :memory: is its own database, so the
        // in-memory case (tests) must stay on a single connection.
        let max_connections = if path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate()
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(db)
    }

    /// Run schema migrations atomically within a transaction.
    ///
    /// All statements use `IF NOT EXISTS`, so re-running against an existing
    /// database is a no-op.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS publishers (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL CHECK(length(name) > 0),
                language TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // The UNIQUE constraint on link is the dedup guarantee: an
        // INSERT ... ON CONFLICT(link) DO NOTHING is an atomic
        // check-and-insert even when ingestion runs overlap.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                publisher_id INTEGER NOT NULL REFERENCES publishers(id) ON DELETE CASCADE,
                title TEXT NOT NULL CHECK(length(title) > 0),
                link TEXT UNIQUE NOT NULL CHECK(length(link) > 0),
                published_date INTEGER,
                main_image TEXT NOT NULL,
                categories TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_publisher ON articles(publisher_id)")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_date DESC)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
