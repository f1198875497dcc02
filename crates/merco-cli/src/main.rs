use clap::{Parser, Subcommand};

use merco_trending::{RunOutcome, TriggerSource};

#[derive(Debug, Parser)]
#[command(name = "merco-cli")]
#[command(about = "Merco operational command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a trending recompute in the foreground and print the summary.
    Recompute {
        /// Lookback window in days; defaults to the configured value.
        #[arg(long)]
        window_days: Option<u32>,
    },
    /// List recent recompute runs.
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Apply migrations and insert demo catalog data.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = merco_core::load_app_config()?;
    let pool = merco_db::connect_pool(
        &config.database_url,
        merco_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Recompute { window_days } => {
            let days = window_days.unwrap_or(config.trending_window_days);
            match merco_trending::execute_run(&pool, TriggerSource::Cli, days).await? {
                RunOutcome::Completed(report) => {
                    println!(
                        "run {} over {}: {} line items, {} products updated, {} shops updated, {} skipped",
                        report.run_id,
                        report.window,
                        report.counts.line_items_seen,
                        report.counts.products_updated,
                        report.counts.shops_updated,
                        report.counts.products_skipped,
                    );
                }
                RunOutcome::Skipped => {
                    println!("another run is in progress; nothing to do");
                }
            }
        }
        Commands::Runs { limit } => {
            let runs = merco_db::list_trending_runs(&pool, limit).await?;
            if runs.is_empty() {
                println!("no recompute runs recorded yet");
            }
            for run in runs {
                println!(
                    "#{} [{}] {} trigger={} items={} products={} shops={} skipped={}{}",
                    run.id,
                    run.created_at.format("%Y-%m-%d %H:%M:%S"),
                    run.status,
                    run.trigger_source,
                    run.line_items_seen,
                    run.products_updated,
                    run.shops_updated,
                    run.products_skipped,
                    run.error_message
                        .map(|e| format!(" error={e}"))
                        .unwrap_or_default(),
                );
            }
        }
        Commands::Seed => {
            merco_db::run_migrations(&pool).await?;
            let summary = merco_db::seed_demo_data(&pool).await?;
            println!(
                "seeded {} shops, {} products, {} order items",
                summary.shops, summary.products, summary.order_items
            );
        }
    }

    Ok(())
}
