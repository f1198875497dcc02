//! Advisory lock serializing trending recompute runs.
//!
//! The recompute can be fired from the scheduler, the HTTP probe, the event
//! webhook, and the CLI, and nothing stops those triggers from overlapping.
//! Because the commit stage adds to counters rather than replacing them,
//! two concurrent runs over the same window would double-count. A Postgres
//! advisory lock gives mutual exclusion across every process that shares
//! the database.

use sqlx::{Connection, PgConnection, PgPool};

use crate::DbError;

/// Stable application-wide key for `pg_try_advisory_lock`.
const TRENDING_RUN_LOCK_KEY: i64 = 771_102_015;

/// Holds the session-scoped advisory lock for the duration of a run.
///
/// The lock lives on a connection detached from the pool, so dropping the
/// guard closes that session and the lock is released by the server even
/// if [`RunLock::release`] is never reached.
pub struct RunLock {
    conn: PgConnection,
}

/// Attempts to take the trending run lock without blocking.
///
/// Returns `None` if another run currently holds the lock.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if acquiring a connection or issuing the lock
/// query fails.
pub async fn try_acquire_run_lock(pool: &PgPool) -> Result<Option<RunLock>, DbError> {
    // Detach so the lock's session is never handed back to the pool while
    // still holding the lock.
    let mut conn = pool.acquire().await?.detach();

    let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
        .bind(TRENDING_RUN_LOCK_KEY)
        .fetch_one(&mut conn)
        .await?;

    if acquired {
        Ok(Some(RunLock { conn }))
    } else {
        let _ = conn.close().await;
        Ok(None)
    }
}

impl RunLock {
    /// Releases the lock and closes the underlying session.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock statement fails; the session
    /// is closed either way.
    pub async fn release(mut self) -> Result<(), DbError> {
        let unlock = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(TRENDING_RUN_LOCK_KEY)
            .execute(&mut self.conn)
            .await;
        let _ = self.conn.close().await;
        unlock?;
        Ok(())
    }
}
