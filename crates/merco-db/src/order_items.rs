//! Read-only access to the `order_items` table.
//!
//! Order line items belong to the order subsystem; this service only scans
//! them to aggregate recent activity.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::DbError;

/// Returns the product id of every order line item created within the
/// closed date range `[start, end]`, at day granularity.
///
/// Timestamps are truncated to UTC calendar dates before comparison so the
/// window boundaries match the selector's date arithmetic. The list keeps
/// one entry per line item (repeats included); occurrence counting happens
/// in the caller. Rows come back in `(created_at, id)` order so the first
/// sighting of each product is deterministic.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_ids_in_window(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT product_id \
         FROM order_items \
         WHERE (created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2 \
         ORDER BY created_at, id",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
