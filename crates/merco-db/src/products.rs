//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub shop_id: i64,
    pub name: String,
    pub price: Option<Decimal>,
    pub trending: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a product the trending engine needs: its id and owning shop.
///
/// A product has exactly one owning shop at read time, so resolving this row
/// once per distinct product is enough to place it in the shop adjacency.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ProductOwnerRow {
    pub id: i64,
    pub shop_id: i64,
}

/// Returns a single product by id, or `None` if no row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, shop_id, name, price, trending, is_active, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Resolves the owning shop of an active product.
///
/// Returns `None` for deleted or deactivated products; the caller decides
/// whether to skip or abort.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_owner(
    pool: &PgPool,
    product_id: i64,
) -> Result<Option<ProductOwnerRow>, DbError> {
    let row = sqlx::query_as::<_, ProductOwnerRow>(
        "SELECT id, shop_id \
         FROM products \
         WHERE id = $1 AND is_active = true",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Adds `delta` to a product's trending counter.
///
/// The counter is incremented in place, never replaced, so scores are
/// cumulative across recompute runs.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product with the given id exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn add_product_trending(
    pool: &PgPool,
    product_id: i64,
    delta: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET trending = trending + $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(delta)
    .bind(product_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
