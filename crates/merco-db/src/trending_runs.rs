//! Database operations for the `trending_runs` table.
//!
//! One row per recompute invocation, whatever trigger fired it. Rows move
//! `queued` -> `running` -> `succeeded` | `failed`; transitions are guarded
//! so a stale handle cannot clobber a finished run.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `trending_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendingRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub line_items_seen: i64,
    pub products_updated: i64,
    pub shops_updated: i64,
    pub products_skipped: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters recorded when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub line_items_seen: i64,
    pub products_updated: i64,
    pub shops_updated: i64,
    pub products_skipped: i64,
}

const SELECT_COLUMNS: &str = "id, public_id, trigger_source, status, window_start, window_end, \
     started_at, completed_at, line_items_seen, products_updated, shops_updated, \
     products_skipped, error_message, created_at";

/// Creates a new trending run in `queued` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_trending_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<TrendingRunRow, DbError> {
    let row = sqlx::query_as::<_, TrendingRunRow>(&format!(
        "INSERT INTO trending_runs (trigger_source, status) \
         VALUES ($1, 'queued') \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running`, recording its date window and `started_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_trending_run(
    pool: &PgPool,
    id: i64,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE trending_runs \
         SET status = 'running', started_at = NOW(), window_start = $1, window_end = $2 \
         WHERE id = $3 AND status = 'queued'",
    )
    .bind(window_start)
    .bind(window_end)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded`, recording `completed_at` and final counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_trending_run(
    pool: &PgPool,
    id: i64,
    counts: RunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE trending_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             line_items_seen = $1, products_updated = $2, \
             shops_updated = $3, products_skipped = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(counts.line_items_seen)
    .bind(counts.products_updated)
    .bind(counts.shops_updated)
    .bind(counts.products_skipped)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, recording `completed_at` and the error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_trending_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE trending_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_trending_run(pool: &PgPool, id: i64) -> Result<TrendingRunRow, DbError> {
    let row = sqlx::query_as::<_, TrendingRunRow>(&format!(
        "SELECT {SELECT_COLUMNS} \
         FROM trending_runs \
         WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trending_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<TrendingRunRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendingRunRow>(&format!(
        "SELECT {SELECT_COLUMNS} \
         FROM trending_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
