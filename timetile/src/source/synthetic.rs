//! Synthetic data source.
//!
//! Generates a deterministic waveform for any address, with optional latency
//! and failure injection. Used by the CLI simulator and by tests that need a
//! source which behaves like a slow or flaky backend.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BoxFuture, DataSource, FetchError, FetchResult};
use crate::address::TileAddress;
use crate::tile::{PlottablePoint, TilePayload};

/// Default number of samples generated per tile.
pub const DEFAULT_POINTS_PER_TILE: usize = 64;

/// Period of the generated waveform, in time units.
const WAVE_PERIOD: f64 = 4096.0;

/// Configuration for [`SyntheticSource`].
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Samples per tile, evenly spaced across the tile's width.
    pub points_per_tile: usize,
    /// Delay before each fetch resolves.
    pub latency: Duration,
    /// Every address fails this many times before it succeeds.
    pub fail_first: u32,
    /// Probability (0.0 - 1.0) that any attempt fails.
    pub failure_rate: f64,
    /// Seed for the failure dice.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            points_per_tile: DEFAULT_POINTS_PER_TILE,
            latency: Duration::ZERO,
            fail_first: 0,
            failure_rate: 0.0,
            seed: 0,
        }
    }
}

#[derive(Debug)]
struct SyntheticInner {
    rng: StdRng,
    calls: HashMap<TileAddress, u32>,
}

/// Source producing a sine wave sampled at tile resolution.
#[derive(Debug)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    inner: Mutex<SyntheticInner>,
}

impl SyntheticSource {
    /// Create a source with the given configuration.
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            inner: Mutex::new(SyntheticInner {
                rng,
                calls: HashMap::new(),
            }),
        }
    }

    /// Total number of fetch invocations so far.
    pub fn invocations(&self) -> u32 {
        self.inner.lock().calls.values().sum()
    }

    /// Number of fetch invocations for one address.
    pub fn invocations_for(&self, address: TileAddress) -> u32 {
        self.inner.lock().calls.get(&address).copied().unwrap_or(0)
    }

    /// Samples for `address`.
    pub fn generate(&self, address: TileAddress) -> Vec<PlottablePoint> {
        let count = self.config.points_per_tile;
        let step = address.width() / count.max(1) as f64;
        (0..count)
            .map(|i| {
                let time = address.min_time() + step * i as f64;
                let value = (time / WAVE_PERIOD * std::f64::consts::TAU).sin();
                PlottablePoint::new(time, value)
            })
            .collect()
    }

    /// Decide whether this attempt fails, recording the invocation.
    fn roll(&self, address: TileAddress) -> bool {
        let mut inner = self.inner.lock();
        let calls = inner.calls.entry(address).or_insert(0);
        *calls += 1;
        let attempt = *calls;

        if attempt <= self.config.fail_first {
            return true;
        }
        self.config.failure_rate > 0.0
            && inner.rng.random::<f64>() < self.config.failure_rate
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(SyntheticConfig::default())
    }
}

impl DataSource for SyntheticSource {
    fn fetch(&self, address: TileAddress) -> BoxFuture<'static, FetchResult> {
        let result = if self.roll(address) {
            Err(FetchError::Injected(address))
        } else {
            Ok(TilePayload::points(self.generate(address)))
        };

        let latency = self.config.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        })
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
