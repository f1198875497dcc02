use thiserror::Error;

/// Failure of a trending recompute run.
///
/// Every error inside a run is caught once at the runner boundary, logged,
/// and recorded on the run's `trending_runs` row. Missing products are the
/// one case handled below this boundary: they are skipped, not raised.
#[derive(Debug, Error)]
pub enum TrendingError {
    #[error(transparent)]
    Db(#[from] merco_db::DbError),
}
