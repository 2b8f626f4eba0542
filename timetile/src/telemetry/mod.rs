//! Scheduler telemetry.
//!
//! The scheduler bumps plain counters as it works; [`SchedulerSnapshot`] is a
//! point-in-time copy of those counters plus the size of the cache.
//!
//! ```text
//! FetchScheduler ─────► SchedulerStats ─────► SchedulerSnapshot ─────► Views
//!                       (counters)            (point-in-time copy)      (CLI, logs)
//! ```

mod snapshot;
mod stats;

pub use snapshot::SchedulerSnapshot;
pub use stats::SchedulerStats;
