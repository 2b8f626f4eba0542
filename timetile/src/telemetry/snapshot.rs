//! Point-in-time scheduler state.

use std::fmt;

use super::SchedulerStats;

/// Copy of the scheduler's counters and cache sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSnapshot {
    /// Lifetime counters.
    pub stats: SchedulerStats,
    /// Tiles held in the store.
    pub resolved_tiles: usize,
    /// Points across all resolved tiles.
    pub resolved_points: usize,
    /// Addresses awaiting a response.
    pub pending: usize,
    /// Fetch futures not yet completed.
    pub in_flight: usize,
    /// Level of the last viewport check, if any.
    pub level: Option<i32>,
}

impl fmt::Display for SchedulerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Some(level) => level.to_string(),
            None => "-".to_string(),
        };
        writeln!(f, "level:          {}", level)?;
        writeln!(
            f,
            "tiles:          {} resolved ({} points), {} pending, {} in flight",
            self.resolved_tiles, self.resolved_points, self.pending, self.in_flight
        )?;
        writeln!(
            f,
            "fetches:        {} issued ({} retries), {} deduplicated",
            self.stats.fetches_issued, self.stats.retries, self.stats.dedup_skips
        )?;
        write!(
            f,
            "outcomes:       {} ok, {} failed, {} abandoned ({:.1}% success)",
            self.stats.successes,
            self.stats.failures,
            self.stats.abandoned,
            self.stats.success_rate() * 100.0
        )
    }
}
