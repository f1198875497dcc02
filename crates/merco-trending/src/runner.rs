//! Entry point shared by every trigger path.
//!
//! Wraps the engine in the advisory run lock and the `trending_runs`
//! bookkeeping: `queued` -> `running` -> `succeeded` | `failed`. A trigger
//! that loses the lock race is reported as [`RunOutcome::Skipped`] rather
//! than queued, which also absorbs duplicate event deliveries.

use chrono::Utc;
use sqlx::PgPool;

use crate::engine::recompute;
use crate::error::TrendingError;
use crate::window::TrendingWindow;

use merco_db::RunCounts;

/// Which collaborator fired the run. Recorded on the run row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Schedule,
    Probe,
    Event,
    Cli,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Schedule => "schedule",
            TriggerSource::Probe => "probe",
            TriggerSource::Event => "event",
            TriggerSource::Cli => "cli",
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one invocation of the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run executed to completion; counters were committed.
    Completed(RunReport),
    /// Another run held the lock; nothing was read or written.
    Skipped,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: i64,
    pub window: TrendingWindow,
    pub counts: RunCounts,
}

/// Executes one trending recompute run end to end.
///
/// Takes the advisory run lock (returning [`RunOutcome::Skipped`] if it is
/// already held), records a `trending_runs` row, scans the
/// `[today - window_days, today]` window, commits the score deltas, and
/// marks the row `succeeded` or `failed`. All stage errors surface here
/// exactly once; the failed run row carries the error message.
///
/// # Errors
///
/// Returns [`TrendingError`] if any stage or bookkeeping write fails.
pub async fn execute_run(
    pool: &PgPool,
    trigger: TriggerSource,
    window_days: u32,
) -> Result<RunOutcome, TrendingError> {
    let Some(lock) = merco_db::try_acquire_run_lock(pool).await? else {
        tracing::info!(%trigger, "trending: run already in progress; skipping");
        return Ok(RunOutcome::Skipped);
    };

    let result = run_locked(pool, trigger, window_days).await;

    if let Err(e) = lock.release().await {
        tracing::warn!(error = %e, "trending: failed to release run lock cleanly");
    }

    result
}

async fn run_locked(
    pool: &PgPool,
    trigger: TriggerSource,
    window_days: u32,
) -> Result<RunOutcome, TrendingError> {
    let run = merco_db::create_trending_run(pool, trigger.as_str()).await?;
    let window = TrendingWindow::ending_at(Utc::now(), window_days);

    merco_db::start_trending_run(pool, run.id, window.start, window.end).await?;
    tracing::info!(run_id = run.id, %trigger, window = %window, "trending: run started");

    match recompute(pool, window).await {
        Ok(counts) => {
            merco_db::complete_trending_run(pool, run.id, counts).await?;
            tracing::info!(
                run_id = run.id,
                line_items_seen = counts.line_items_seen,
                products_updated = counts.products_updated,
                shops_updated = counts.shops_updated,
                products_skipped = counts.products_skipped,
                "trending: run succeeded"
            );
            Ok(RunOutcome::Completed(RunReport {
                run_id: run.id,
                window,
                counts,
            }))
        }
        Err(e) => {
            tracing::error!(run_id = run.id, error = %e, "trending: run failed");
            if let Err(mark_err) =
                merco_db::fail_trending_run(pool, run.id, &e.to_string()).await
            {
                tracing::error!(
                    run_id = run.id,
                    error = %mark_err,
                    "trending: failed to record run failure"
                );
            }
            Err(e)
        }
    }
}
