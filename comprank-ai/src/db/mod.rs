//! Database access for comprank-ai
//!
//! SQLite file in the root folder. Holds the current job between ticks so a
//! page refresh or a restart resumes from the last persisted cursor.

pub mod jobs;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Default total retry budget for a locked database
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the schema applied
///
/// Single connection: every connection to `sqlite::memory:` is a separate
/// database.
pub async fn init_in_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create tables if they don't exist
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Single slot: one active job per installation
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            slot INTEGER PRIMARY KEY CHECK (slot = 1),
            state TEXT NOT NULL,
            cursor INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL DEFAULT 0,
            job TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (settings, jobs)");

    Ok(())
}

/// Retry budget for lock contention, from the settings table
pub async fn max_lock_wait_ms(pool: &SqlitePool) -> comprank_common::Result<u64> {
    let value: Option<i64> = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'database_max_lock_wait_ms'",
    )
    .fetch_optional(pool)
    .await?;

    Ok(value
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(DEFAULT_MAX_LOCK_WAIT_MS))
}
