//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring trending recompute job.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use merco_trending::{RunOutcome, TriggerSource};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<merco_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_trending_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring trending recompute job.
///
/// Runs every 12 hours by default (`0 0 */12 * * *`); the cadence can be
/// overridden with `MERCO_TRENDING_CRON`. The job shares the run entry
/// point with the probe and event triggers, so an overlapping invocation
/// is skipped by the run lock rather than double-counted.
async fn register_trending_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<merco_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let cron = config.trending_cron.clone();
    let window_days = config.trending_window_days;
    let pool = Arc::new(pool);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            tracing::info!("scheduler: starting trending recompute run");
            run_trending_job(&pool, window_days).await;
            tracing::info!("scheduler: trending recompute run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, window_days, "scheduler: registered trending recompute job");
    Ok(())
}

/// Drive one scheduled recompute run.
///
/// The run outcome (including failure) lands on its `trending_runs` row;
/// here we only log, matching the fire-and-forget nature of the trigger.
async fn run_trending_job(pool: &PgPool, window_days: u32) {
    match merco_trending::execute_run(pool, TriggerSource::Schedule, window_days).await {
        Ok(RunOutcome::Completed(report)) => {
            tracing::info!(
                run_id = report.run_id,
                products_updated = report.counts.products_updated,
                shops_updated = report.counts.shops_updated,
                "scheduler: trending run completed"
            );
        }
        Ok(RunOutcome::Skipped) => {
            tracing::info!("scheduler: trending run already in progress; tick skipped");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: trending run failed");
        }
    }
}
