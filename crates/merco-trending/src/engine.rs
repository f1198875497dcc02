//! The scan/build/commit pipeline of a single recompute run.
//!
//! Three sequential stages over in-memory collections: aggregate line-item
//! activity per product, resolve each distinct product's owning shop into a
//! shop adjacency, then propagate the deltas to the persisted counters.
//! There is no parallelism and no transactional grouping; a write failure
//! partway through leaves earlier writes applied and aborts the run.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::aggregate::{count_occurrences, WindowCounts};
use crate::error::TrendingError;
use crate::window::TrendingWindow;

use merco_db::RunCounts;

/// Transient shop -> products grouping for one run.
///
/// Products and shops stay flat records referenced by id; each product
/// lands under exactly one shop. Shop iteration order follows the first
/// sighting of each shop in the window scan.
#[derive(Debug, Default)]
struct ShopAdjacency {
    products_by_shop: HashMap<i64, Vec<i64>>,
    shop_order: Vec<i64>,
}

impl ShopAdjacency {
    fn attach(&mut self, shop_id: i64, product_id: i64) {
        let products = self.products_by_shop.entry(shop_id).or_default();
        if products.is_empty() {
            self.shop_order.push(shop_id);
        }
        products.push(product_id);
    }
}

/// Runs the aggregation and commit stages for the given window.
///
/// Line items referencing a product that no longer exists (or has been
/// deactivated) are skipped with a warning; their counts contribute to no
/// shop. Any other data-access failure aborts the run.
///
/// # Errors
///
/// Returns [`TrendingError::Db`] on any query or write failure.
pub async fn recompute(pool: &PgPool, window: TrendingWindow) -> Result<RunCounts, TrendingError> {
    let product_ids = merco_db::list_product_ids_in_window(pool, window.start, window.end).await?;
    let counts = count_occurrences(&product_ids);

    if counts.is_empty() {
        tracing::info!(window = %window, "trending: no order activity in window");
        return Ok(RunCounts::default());
    }

    tracing::info!(
        window = %window,
        line_items = product_ids.len(),
        distinct_products = counts.len(),
        "trending: aggregated window activity"
    );

    let (adjacency, products_skipped) = resolve_owners(pool, &counts).await?;
    let mut run_counts = commit_scores(pool, &counts, &adjacency).await?;

    run_counts.line_items_seen = i64::try_from(product_ids.len()).unwrap_or(i64::MAX);
    run_counts.products_skipped = products_skipped;

    Ok(run_counts)
}

/// Resolves the owning shop of every distinct product, one lookup each.
///
/// Returns the adjacency plus the number of products skipped because the
/// lookup came back empty.
async fn resolve_owners(
    pool: &PgPool,
    counts: &WindowCounts,
) -> Result<(ShopAdjacency, i64), TrendingError> {
    let mut adjacency = ShopAdjacency::default();
    let mut skipped = 0i64;

    for &product_id in counts.distinct_products() {
        match merco_db::get_product_owner(pool, product_id).await? {
            Some(owner) => adjacency.attach(owner.shop_id, owner.id),
            None => {
                tracing::warn!(
                    product_id,
                    "trending: line items reference a missing or inactive product; skipping"
                );
                skipped += 1;
            }
        }
    }

    Ok((adjacency, skipped))
}

/// Adds each product's window count to its trending counter, accumulates
/// the per-shop sum, and adds that to the shop's counter.
///
/// One UPDATE per product, applied immediately, then one UPDATE per shop
/// after its product loop completes.
async fn commit_scores(
    pool: &PgPool,
    counts: &WindowCounts,
    adjacency: &ShopAdjacency,
) -> Result<RunCounts, TrendingError> {
    let mut run_counts = RunCounts::default();

    for &shop_id in &adjacency.shop_order {
        let Some(products) = adjacency.products_by_shop.get(&shop_id) else {
            continue;
        };

        let mut shop_delta = 0i64;
        for &product_id in products {
            let delta = counts.get(product_id);
            merco_db::add_product_trending(pool, product_id, delta).await?;
            shop_delta += delta;
            run_counts.products_updated += 1;
        }

        merco_db::add_shop_trending(pool, shop_id, shop_delta).await?;
        run_counts.shops_updated += 1;

        tracing::debug!(shop_id, shop_delta, "trending: shop scores committed");
    }

    Ok(run_counts)
}
