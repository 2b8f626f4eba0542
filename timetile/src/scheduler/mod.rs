//! Fetch scheduler.
//!
//! Turns viewport checks into a bounded set of deduplicated, retried fetches
//! and collects their results into a [`TileStore`].
//!
//! # Event loop
//!
//! The scheduler is single-threaded and owned by one task. Fetch futures live
//! in a [`FuturesUnordered`] inside the scheduler and make progress only while
//! the owner drives them:
//!
//! - [`next_completion`](FetchScheduler::next_completion) waits for and applies one completion
//! - [`drain_ready`](FetchScheduler::drain_ready) applies whatever has already finished
//! - [`run_until_idle`](FetchScheduler::run_until_idle) applies completions until nothing is in flight
//!
//! Completions arrive in any order. Each one updates the store, the pending
//! set and the retry counters, then notifies listeners, all before the next
//! one is looked at.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use timetile::scheduler::{FetchScheduler, SchedulerConfig};
//! use timetile::selector::best_tile_at;
//! use timetile::source::SyntheticSource;
//!
//! # tokio_test_block_on(async {
//! let source = Arc::new(SyntheticSource::default());
//! let mut scheduler = FetchScheduler::new(source, SchedulerConfig::default());
//!
//! let issued = scheduler.check_for_fetch(0, 0.0, 1024.0).unwrap();
//! assert_eq!(issued, 2);
//!
//! scheduler.run_until_idle().await;
//! assert!(best_tile_at(scheduler.store(), 100.0, 0).is_some());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

mod error;
mod policy;
mod window;

pub use error::SchedulerError;
pub use policy::{
    Backoff, RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS,
    DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_RETRIES,
};
pub use window::{FetchPlan, FetchWindow};

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::address::{offset_range, TileAddress, TileKey, MIN_LEVEL};
use crate::listener::{ListenerId, ListenerRegistry, LoadListener};
use crate::source::{BoxFuture, DataSource, FetchError, FetchResult};
use crate::store::TileStore;
use crate::telemetry::{SchedulerSnapshot, SchedulerStats};
use crate::tile::{Tile, TilePayload, TileState};
use crate::viewport::ViewportProvider;

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Retry budget and backoff for failed fetches.
    pub retry: RetryPolicy,
    /// Finest level the data is available at; zooming in stops here.
    pub min_level: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            min_level: MIN_LEVEL,
        }
    }
}

type Completion = (TileAddress, FetchResult);

/// Tile cache and fetch scheduler for one chart series.
pub struct FetchScheduler {
    source: Arc<dyn DataSource>,
    config: SchedulerConfig,
    viewport: Option<Arc<dyn ViewportProvider>>,

    store: TileStore,
    pending: HashSet<TileAddress>,
    attempts: HashMap<TileKey, u32>,
    window: Option<FetchWindow>,

    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    listeners: ListenerRegistry,
    stats: SchedulerStats,
}

impl fmt::Debug for FetchScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchScheduler")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("resolved", &self.store.len())
            .field("pending", &self.pending.len())
            .field("in_flight", &self.in_flight.len())
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl FetchScheduler {
    /// Create a scheduler fetching from `source`.
    pub fn new(source: Arc<dyn DataSource>, config: SchedulerConfig) -> Self {
        Self {
            source,
            config,
            viewport: None,
            store: TileStore::new(),
            pending: HashSet::new(),
            attempts: HashMap::new(),
            window: None,
            in_flight: FuturesUnordered::new(),
            listeners: ListenerRegistry::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// Attach the viewport read by [`check_viewport`](Self::check_viewport).
    pub fn with_viewport_provider(mut self, provider: Arc<dyn ViewportProvider>) -> Self {
        self.viewport = Some(provider);
        self
    }

    /// Settings this scheduler runs with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // =========================================================================
    // Viewport checks
    // =========================================================================

    /// Request whatever the viewport `[viewport_min, viewport_max)` at
    /// `desired_level` needs that is not already resolved or in flight.
    ///
    /// A level change (or the first check) requests every tile in view. A
    /// check at the same level requests only the tile past whichever edge
    /// moved outward, left edge first. The remembered window is updated
    /// either way.
    ///
    /// Returns the number of fetches issued.
    ///
    /// # Errors
    ///
    /// Fails only for invalid input: non-finite bounds, `min > max`, or a
    /// level outside the supported range. Nothing is requested and the
    /// remembered window is left untouched.
    pub fn check_for_fetch(
        &mut self,
        desired_level: i32,
        viewport_min: f64,
        viewport_max: f64,
    ) -> Result<usize, SchedulerError> {
        if !viewport_min.is_finite() || !viewport_max.is_finite() || viewport_min > viewport_max
        {
            return Err(SchedulerError::InvalidViewport {
                min: viewport_min,
                max: viewport_max,
            });
        }

        let (min_offset, max_offset) = offset_range(desired_level, viewport_min, viewport_max)?;
        let next = FetchWindow::new(desired_level, min_offset, max_offset);
        let plan = FetchPlan::between(self.window, next);

        if self.window.map(|w| w.level) != Some(desired_level) {
            info!(
                level = desired_level,
                min_offset, max_offset, "Viewport level changed"
            );
        }
        trace!(
            level = desired_level,
            min = viewport_min,
            max = viewport_max,
            plan = plan.kind(),
            "Viewport check"
        );

        let issued = plan
            .addresses()
            .filter(|&address| self.request_address(address))
            .count();

        self.window = Some(next);
        Ok(issued)
    }

    /// [`check_for_fetch`](Self::check_for_fetch) with the attached viewport.
    pub fn check_viewport(&mut self) -> Result<usize, SchedulerError> {
        let viewport = self
            .viewport
            .as_ref()
            .ok_or(SchedulerError::NoViewportProvider)?
            .viewport();
        self.check_for_fetch(viewport.level, viewport.min, viewport.max)
    }

    /// Whether the viewport may zoom in past the last checked level.
    ///
    /// True until the first check, then true while the last level is above
    /// the configured minimum.
    pub fn allows_zoom_in(&self) -> bool {
        self.window
            .map_or(true, |window| window.level > self.config.min_level)
    }

    // =========================================================================
    // Fetch lifecycle
    // =========================================================================

    /// Fetch `address` unless it is already resolved or in flight.
    ///
    /// A new request starts a fresh retry budget. Returns `true` if a fetch
    /// was issued.
    pub fn request_address(&mut self, address: TileAddress) -> bool {
        if self.store.contains(&address) || self.pending.contains(&address) {
            debug!(tile = %address, "Already resolved or pending, skipping");
            self.stats.record_dedup_skip();
            return false;
        }

        self.pending.insert(address);
        self.attempts.remove(&address.key());
        self.issue(address, Duration::ZERO, false);
        true
    }

    /// Record a successful fetch.
    ///
    /// Called for every completion the scheduler drives; public so a host
    /// that answers fetches by other means can report them directly.
    pub fn on_fetch_success(&mut self, address: TileAddress, payload: TilePayload) {
        debug!(tile = %address, kind = payload.kind(), len = payload.len(), "Tile loaded");

        self.pending.remove(&address);
        self.attempts.remove(&address.key());
        self.store.insert(Tile::new(address, payload));
        self.stats.record_success();
        self.listeners.notify_success();
    }

    /// Record a failed fetch attempt, re-fetching while the budget allows.
    pub fn on_fetch_failure(&mut self, address: TileAddress) {
        let counter = self.attempts.entry(address.key()).or_insert(0);
        *counter = counter.saturating_add(1);
        let failures = *counter;

        self.stats.record_failure();
        self.listeners.notify_failure();

        match self.config.retry.delay_for_retry(failures) {
            Some(delay) => {
                debug!(
                    tile = %address,
                    failures,
                    delay = ?delay,
                    "Retrying failed fetch"
                );
                self.pending.insert(address);
                self.issue(address, delay, true);
            }
            None => {
                warn!(tile = %address, failures, "Giving up on tile");
                self.pending.remove(&address);
                self.stats.record_abandoned();
            }
        }
    }

    /// Invoke the data source and queue the resulting future.
    ///
    /// The source is called now; `delay` only postpones the first poll.
    /// Without a tokio runtime there is no timer, and the delay is skipped.
    fn issue(&mut self, address: TileAddress, delay: Duration, retry: bool) {
        debug!(tile = %address, source = self.source.name(), retry, "Issuing fetch");
        let fetch = self.source.fetch(address);
        self.stats.record_issued(retry);

        let delay = if !delay.is_zero() && Handle::try_current().is_err() {
            debug!(tile = %address, delay = ?delay, "No runtime, retrying without delay");
            Duration::ZERO
        } else {
            delay
        };

        self.in_flight.push(Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (address, fetch.await)
        }));
    }

    fn complete(&mut self, address: TileAddress, result: FetchResult) {
        match result {
            Ok(payload) => self.on_fetch_success(address, payload),
            Err(e) => {
                log_failure(address, &e);
                self.on_fetch_failure(address);
            }
        }
    }

    // =========================================================================
    // Driving completions
    // =========================================================================

    /// Wait for the next fetch to finish and apply it.
    ///
    /// Returns the completed address, or `None` at once if nothing is in
    /// flight.
    pub async fn next_completion(&mut self) -> Option<TileAddress> {
        let (address, result) = self.in_flight.next().await?;
        self.complete(address, result);
        Some(address)
    }

    /// Apply every completion that is ready, without waiting.
    ///
    /// Returns the number applied. Retries issued along the way are polled
    /// too, so a source that fails synchronously runs through its whole
    /// retry budget here when the backoff is immediate.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(Some((address, result))) = self.in_flight.next().now_or_never() else {
                break;
            };
            self.complete(address, result);
            applied += 1;
        }
        applied
    }

    /// Apply completions until nothing is in flight.
    ///
    /// Never returns while a fetch future stays unresolved.
    pub async fn run_until_idle(&mut self) -> usize {
        let mut applied = 0;
        while self.next_completion().await.is_some() {
            applied += 1;
        }
        applied
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register a load listener.
    pub fn subscribe(&mut self, listener: Arc<dyn LoadListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Remove a load listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Resolved tiles.
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Where `address` stands, or `None` if it was never requested.
    pub fn state(&self, address: TileAddress) -> Option<TileState> {
        if let Some(tile) = self.store.get(&address) {
            return Some(TileState::Resolved(Arc::clone(tile)));
        }

        let failures = self.attempts.get(&address.key()).copied().unwrap_or(0);
        if self.pending.contains(&address) {
            Some(TileState::Pending {
                attempt: failures.saturating_add(1),
            })
        } else if !self.config.retry.should_retry(failures) {
            Some(TileState::Abandoned)
        } else {
            None
        }
    }

    /// Failures recorded for `address` since its last success.
    pub fn failures(&self, address: TileAddress) -> u32 {
        self.attempts.get(&address.key()).copied().unwrap_or(0)
    }

    /// Addresses awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Fetch futures not yet completed.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Window of the last viewport check.
    pub fn window(&self) -> Option<FetchWindow> {
        self.window
    }

    /// Lifetime counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Counters and cache sizes right now.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            stats: self.stats,
            resolved_tiles: self.store.len(),
            resolved_points: self.store.point_count(),
            pending: self.pending.len(),
            in_flight: self.in_flight.len(),
            level: self.window.map(|w| w.level),
        }
    }
}

fn log_failure(address: TileAddress, error: &FetchError) {
    debug!(tile = %address, error = %error, "Fetch failed");
}
