//! Database operations for the `shops` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `shops` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub trending: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns a single shop by id, or `None` if no row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_shop(pool: &PgPool, shop_id: i64) -> Result<Option<ShopRow>, DbError> {
    let row = sqlx::query_as::<_, ShopRow>(
        "SELECT id, public_id, name, slug, trending, is_active, created_at, updated_at \
         FROM shops \
         WHERE id = $1",
    )
    .bind(shop_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Adds `delta` to a shop's trending counter.
///
/// The counter is incremented in place, never replaced, so scores are
/// cumulative across recompute runs.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no shop with the given id exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn add_shop_trending(pool: &PgPool, shop_id: i64, delta: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE shops \
         SET trending = trending + $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(delta)
    .bind(shop_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
