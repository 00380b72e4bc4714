//! Job persistence
//!
//! The whole job is stored as JSON in a single-row table. State, cursor and
//! total are duplicated into columns for inspection with the sqlite shell.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use comprank_common::{Error, Result};

use crate::models::Job;
use crate::utils::retry_on_lock;

/// Save the current job, replacing any previous one
///
/// Uses retry_on_lock to ride out transient lock contention.
pub async fn save_job(pool: &SqlitePool, job: &Job) -> Result<()> {
    // Prepare all data BEFORE acquiring database connection
    let state = serde_json::to_string(&job.state())
        .map_err(|e| Error::Internal(format!("Failed to serialize state: {}", e)))?;
    let body = serde_json::to_string(job)
        .map_err(|e| Error::Internal(format!("Failed to serialize job: {}", e)))?;
    let cursor = job.progress.cursor as i64;
    let total = job.progress.total as i64;
    let updated_at = Utc::now().to_rfc3339();

    let max_wait_ms = crate::db::max_lock_wait_ms(pool).await?;

    retry_on_lock("save_job", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO jobs (slot, state, cursor, total, job, updated_at)
            VALUES (1, ?, ?, ?, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                state = excluded.state,
                cursor = excluded.cursor,
                total = excluded.total,
                job = excluded.job,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&state)
        .bind(cursor)
        .bind(total)
        .bind(&body)
        .bind(&updated_at)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    })
    .await
}

/// Load the persisted job, if any
pub async fn load_job(pool: &SqlitePool) -> Result<Option<Job>> {
    let row = sqlx::query("SELECT job FROM jobs WHERE slot = 1")
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let body: String = row.get("job");
            let job: Job = serde_json::from_str(&body)
                .map_err(|e| Error::Internal(format!("Failed to deserialize job: {}", e)))?;
            Ok(Some(job))
        }
        None => Ok(None),
    }
}

/// Load the persisted job or start a fresh one
pub async fn load_or_new(pool: &SqlitePool) -> Result<Job> {
    Ok(load_job(pool).await?.unwrap_or_default())
}

/// Remove the persisted job in one statement
pub async fn delete_job(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM jobs WHERE slot = 1")
        .execute(pool)
        .await?;

    Ok(())
}
