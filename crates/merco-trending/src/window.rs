use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Default lookback for a recompute run, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 15;

/// Closed calendar-date range `[start, end]` scanned by one recompute run.
///
/// Time-of-day is discarded: the window is compared at day granularity on
/// both sides, matching the day-truncated scan in `merco_db::order_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TrendingWindow {
    /// Builds the window ending on the calendar date of `now` and starting
    /// `lookback_days` earlier. Both endpoints are inclusive.
    #[must_use]
    pub fn ending_at(now: DateTime<Utc>, lookback_days: u32) -> Self {
        let end = now.date_naive();
        let start = end - Duration::days(i64::from(lookback_days));
        Self { start, end }
    }

    /// Whether `date` falls inside the closed range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for TrendingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
