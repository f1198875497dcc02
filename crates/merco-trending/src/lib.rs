//! Trending recomputation engine.
//!
//! Periodically scans recent order line items, counts occurrences per
//! product, groups the touched products under their owning shops, and adds
//! the resulting deltas to the persisted `trending` counters on products
//! and shops. All trigger paths (scheduler, HTTP probe, event webhook,
//! CLI) funnel into [`execute_run`], which serializes runs behind a
//! database advisory lock and records each invocation in `trending_runs`.

mod aggregate;
mod engine;
mod error;
mod runner;
mod window;

pub use aggregate::{count_occurrences, WindowCounts};
pub use engine::recompute;
pub use error::TrendingError;
pub use runner::{execute_run, RunOutcome, RunReport, TriggerSource};
pub use window::{TrendingWindow, DEFAULT_WINDOW_DAYS};
