//! Development seed data: a couple of shops with products and a spread of
//! recent order line items, enough to make a local recompute produce
//! non-zero trending scores.

use sqlx::PgPool;

use crate::DbError;

/// Counts of rows inserted by [`seed_demo_data`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedSummary {
    pub shops: usize,
    pub products: usize,
    pub order_items: usize,
}

/// Inserts demo shops, products, and order line items.
///
/// Shops conflict on `slug` and are updated in place, so reseeding is safe.
/// Order items are always appended; they model immutable order history.
/// All inserts run inside a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the whole batch rolls back.
pub async fn seed_demo_data(pool: &PgPool) -> Result<SeedSummary, DbError> {
    let shops = [("Aurora Goods", "aurora-goods"), ("Basalt & Birch", "basalt-birch")];
    let products: [(&str, &str, &str); 4] = [
        ("aurora-goods", "Enamel Mug", "18.00"),
        ("aurora-goods", "Wool Throw", "89.00"),
        ("basalt-birch", "Cedar Candle", "24.50"),
        ("basalt-birch", "Stone Coasters", "32.00"),
    ];

    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for (name, slug) in &shops {
        sqlx::query(
            "INSERT INTO shops (name, slug, is_active) \
             VALUES ($1, $2, true) \
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()",
        )
        .bind(name)
        .bind(slug)
        .execute(&mut *tx)
        .await?;
        summary.shops += 1;
    }

    let mut product_ids = Vec::new();
    for (shop_slug, name, price) in &products {
        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO products (shop_id, name, price, is_active) \
             SELECT id, $2, $3::numeric(10,2), true FROM shops WHERE slug = $1 \
             RETURNING id",
        )
        .bind(shop_slug)
        .bind(name)
        .bind(price)
        .fetch_one(&mut *tx)
        .await?;
        product_ids.push(product_id);
        summary.products += 1;
    }

    // Spread line items over the last two weeks so a default 15-day window
    // picks them all up. Earlier products get more orders.
    for (idx, product_id) in product_ids.iter().enumerate() {
        let orders = product_ids.len() - idx;
        for day in 0..orders {
            sqlx::query(
                "INSERT INTO order_items (product_id, quantity, created_at) \
                 VALUES ($1, 1, NOW() - make_interval(days => $2))",
            )
            .bind(product_id)
            .bind(i32::try_from(day * 3).unwrap_or(0))
            .execute(&mut *tx)
            .await?;
            summary.order_items += 1;
        }
    }

    tx.commit().await?;
    Ok(summary)
}
