//! Viewport contract.
//!
//! The scheduler does not own an axis. Whatever does (a chart widget, a test,
//! the CLI simulator) exposes the visible range through [`ViewportProvider`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::address::{level_for_span, MAX_LEVEL, MIN_LEVEL};

/// Visible time range and the level to fetch it at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub level: i32,
    pub min: f64,
    pub max: f64,
}

impl Viewport {
    /// Viewport with an explicit level.
    pub fn new(level: i32, min: f64, max: f64) -> Self {
        Self { level, min, max }
    }

    /// Viewport whose level is derived from its width.
    ///
    /// One tile per visible width: the level is `floor(log2(width / 512))`,
    /// clamped into the valid level range. A zero or invalid width maps to
    /// level 0.
    ///
    /// ```
    /// use timetile::viewport::Viewport;
    ///
    /// assert_eq!(Viewport::from_range(0.0, 512.0).level, 0);
    /// assert_eq!(Viewport::from_range(0.0, 1000.0).level, 0);
    /// assert_eq!(Viewport::from_range(0.0, 1024.0).level, 1);
    /// assert_eq!(Viewport::from_range(0.0, 100.0).level, -3);
    /// ```
    pub fn from_range(min: f64, max: f64) -> Self {
        Self::new(level_for_width(max - min), min, max)
    }

    /// Visible width.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Same width, shifted by `delta`.
    pub fn panned(&self, delta: f64) -> Self {
        Self::new(self.level, self.min + delta, self.max + delta)
    }

    /// Width scaled by `factor` around the center, level re-derived.
    pub fn zoomed(&self, factor: f64) -> Self {
        let center = (self.min + self.max) / 2.0;
        let half = self.width() * factor / 2.0;
        Self::from_range(center - half, center + half)
    }
}

fn level_for_width(width: f64) -> i32 {
    let level = level_for_span(width).floor();
    if level.is_finite() {
        level.clamp(MIN_LEVEL as f64, MAX_LEVEL as f64) as i32
    } else {
        0
    }
}

/// Source of the current viewport.
pub trait ViewportProvider: Send + Sync {
    fn viewport(&self) -> Viewport;
}

/// Viewport held in shared memory.
///
/// The owner moves it with [`set`](SharedViewport::set); the scheduler reads
/// it on every `check_viewport`. Clones share the same viewport.
#[derive(Debug, Clone)]
pub struct SharedViewport {
    inner: Arc<RwLock<Viewport>>,
}

impl SharedViewport {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            inner: Arc::new(RwLock::new(viewport)),
        }
    }

    /// Replace the viewport.
    pub fn set(&self, viewport: Viewport) {
        *self.inner.write() = viewport;
    }

    /// Apply `f` to the viewport in place.
    pub fn update(&self, f: impl FnOnce(&Viewport) -> Viewport) {
        let mut guard = self.inner.write();
        let next = f(&guard);
        *guard = next;
    }
}

impl ViewportProvider for SharedViewport {
    fn viewport(&self) -> Viewport {
        *self.inner.read()
    }
}

impl ViewportProvider for Viewport {
    fn viewport(&self) -> Viewport {
        *self
    }
}
