//! Scheduler counters.

/// Counters accumulated over a scheduler's lifetime.
///
/// The scheduler is single-threaded, so these are plain integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Data source invocations, first attempts and retries.
    pub fetches_issued: u64,
    /// Invocations that were retries of a failed fetch.
    pub retries: u64,
    /// Fetches that completed with a payload.
    pub successes: u64,
    /// Fetch attempts that failed.
    pub failures: u64,
    /// Addresses given up on after exhausting their retries.
    pub abandoned: u64,
    /// Requests skipped because the address was resolved or in flight.
    pub dedup_skips: u64,
}

impl SchedulerStats {
    pub(crate) fn record_issued(&mut self, retry: bool) {
        self.fetches_issued += 1;
        if retry {
            self.retries += 1;
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.successes += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub(crate) fn record_abandoned(&mut self) {
        self.abandoned += 1;
    }

    pub(crate) fn record_dedup_skip(&mut self) {
        self.dedup_skips += 1;
    }

    /// Fraction of completed attempts that succeeded (1.0 when none completed).
    pub fn success_rate(&self) -> f64 {
        let completed = self.successes + self.failures;
        if completed == 0 {
            1.0
        } else {
            self.successes as f64 / completed as f64
        }
    }
}
