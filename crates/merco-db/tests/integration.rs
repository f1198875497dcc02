//! Schema-backed tests for the db crate.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use merco_db::{DbError, RunCounts};

async fn seed_shop(pool: &PgPool, slug: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO shops (name, slug, is_active) VALUES ($1, $2, true) RETURNING id",
    )
    .bind(format!("Shop {slug}"))
    .bind(slug)
    .fetch_one(pool)
    .await
    .expect("seed shop")
}

async fn seed_product(pool: &PgPool, shop_id: i64, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (shop_id, name, is_active) VALUES ($1, $2, true) RETURNING id",
    )
    .bind(shop_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("seed product")
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_item_scan_is_day_granular(pool: PgPool) {
    let shop = seed_shop(&pool, "scan-shop").await;
    let product = seed_product(&pool, shop, "Scanned").await;

    // One item per day across a five-day stretch.
    for days_ago in 0..5 {
        sqlx::query(
            "INSERT INTO order_items (product_id, created_at) \
             VALUES ($1, NOW() - make_interval(days => $2))",
        )
        .bind(product)
        .bind(days_ago)
        .execute(&pool)
        .await
        .expect("seed order item");
    }

    let today = Utc::now().date_naive();
    let ids = merco_db::list_product_ids_in_window(&pool, today - Duration::days(2), today)
        .await
        .expect("scan window");

    assert_eq!(ids.len(), 3, "closed range covers exactly three days");
    assert!(ids.iter().all(|&id| id == product));
}

#[sqlx::test(migrations = "../../migrations")]
async fn trending_increments_accumulate(pool: PgPool) {
    let shop = seed_shop(&pool, "inc-shop").await;
    let product = seed_product(&pool, shop, "Incremented").await;

    merco_db::add_product_trending(&pool, product, 3).await.expect("first add");
    merco_db::add_product_trending(&pool, product, 2).await.expect("second add");
    merco_db::add_shop_trending(&pool, shop, 5).await.expect("shop add");

    let product_row = merco_db::get_product(&pool, product)
        .await
        .expect("get product")
        .expect("product exists");
    assert_eq!(product_row.trending, 5);

    let shop_row = merco_db::get_shop(&pool, shop)
        .await
        .expect("get shop")
        .expect("shop exists");
    assert_eq!(shop_row.trending, 5);
}

#[sqlx::test(migrations = "../../migrations")]
async fn add_trending_to_unknown_product_is_not_found(pool: PgPool) {
    let result = merco_db::add_product_trending(&pool, 123_456, 1).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_owner_excludes_inactive_products(pool: PgPool) {
    let shop = seed_shop(&pool, "owner-shop").await;
    let product = seed_product(&pool, shop, "Owned").await;

    let owner = merco_db::get_product_owner(&pool, product)
        .await
        .expect("owner lookup")
        .expect("active product resolves");
    assert_eq!(owner.shop_id, shop);

    sqlx::query("UPDATE products SET is_active = false WHERE id = $1")
        .bind(product)
        .execute(&pool)
        .await
        .expect("deactivate");

    let owner = merco_db::get_product_owner(&pool, product)
        .await
        .expect("owner lookup");
    assert!(owner.is_none(), "inactive products resolve to no owner");
}

#[sqlx::test(migrations = "../../migrations")]
async fn trending_run_lifecycle(pool: PgPool) {
    let run = merco_db::create_trending_run(&pool, "probe").await.expect("create");
    assert_eq!(run.status, "queued");
    assert_eq!(run.trigger_source, "probe");

    let today = Utc::now().date_naive();
    merco_db::start_trending_run(&pool, run.id, today - Duration::days(15), today)
        .await
        .expect("start");

    let counts = RunCounts {
        line_items_seen: 12,
        products_updated: 4,
        shops_updated: 2,
        products_skipped: 1,
    };
    merco_db::complete_trending_run(&pool, run.id, counts).await.expect("complete");

    let row = merco_db::get_trending_run(&pool, run.id).await.expect("fetch");
    assert_eq!(row.status, "succeeded");
    assert_eq!(row.line_items_seen, 12);
    assert_eq!(row.products_skipped, 1);
    assert!(row.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn completing_a_queued_run_is_rejected(pool: PgPool) {
    let run = merco_db::create_trending_run(&pool, "cli").await.expect("create");

    let result = merco_db::complete_trending_run(&pool, run.id, RunCounts::default()).await;
    assert!(
        matches!(result, Err(DbError::InvalidRunTransition { expected_status: "running", .. })),
        "completing a run that never started must fail, got: {result:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_run_records_error_message(pool: PgPool) {
    let run = merco_db::create_trending_run(&pool, "schedule").await.expect("create");
    let today = Utc::now().date_naive();
    merco_db::start_trending_run(&pool, run.id, today - Duration::days(15), today)
        .await
        .expect("start");

    merco_db::fail_trending_run(&pool, run.id, "connection reset").await.expect("fail");

    let row = merco_db::get_trending_run(&pool, run.id).await.expect("fetch");
    assert_eq!(row.status, "failed");
    assert_eq!(row.error_message.as_deref(), Some("connection reset"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_list_is_newest_first(pool: PgPool) {
    for source in ["schedule", "probe", "event"] {
        merco_db::create_trending_run(&pool, source).await.expect("create");
    }

    let runs = merco_db::list_trending_runs(&pool, 2).await.expect("list");
    assert_eq!(runs.len(), 2);
    assert!(runs[0].id > runs[1].id, "rows come back newest first");
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_lock_is_exclusive(pool: PgPool) {
    let lock = merco_db::try_acquire_run_lock(&pool)
        .await
        .expect("first acquire")
        .expect("lock free");

    let second = merco_db::try_acquire_run_lock(&pool).await.expect("second acquire");
    assert!(second.is_none(), "lock is held; second attempt must lose");

    lock.release().await.expect("release");

    let third = merco_db::try_acquire_run_lock(&pool)
        .await
        .expect("third acquire");
    assert!(third.is_some(), "lock is free again after release");
    if let Some(lock) = third {
        lock.release().await.expect("release");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_demo_data_populates_catalog(pool: PgPool) {
    let summary = merco_db::seed_demo_data(&pool).await.expect("seed");

    assert_eq!(summary.shops, 2);
    assert_eq!(summary.products, 4);
    assert!(summary.order_items > 0);

    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .expect("count products");
    assert_eq!(product_count, 4);
}
