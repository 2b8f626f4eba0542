//! timetile - multi-resolution tile cache for time-series charts
//!
//! Long time series are split into tiles on a level/offset pyramid: every
//! level up doubles the time span of a tile, so a chart can show years of
//! data from a handful of coarse tiles and a few minutes from fine ones.
//!
//! This crate provides:
//!
//! - [`address`]: tile addressing and time arithmetic
//! - [`scheduler`]: viewport-driven, deduplicated, retried fetching
//! - [`selector`]: best-resolution tile selection over what has arrived
//! - [`source`]: the data source contract with HTTP, callback and synthetic implementations
//! - [`config`], [`logging`], [`telemetry`]: the ambient pieces binaries need
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use timetile::scheduler::{FetchScheduler, SchedulerConfig};
//! use timetile::selector::best_tiles_covering;
//! use timetile::source::SyntheticSource;
//!
//! let mut scheduler = FetchScheduler::new(
//!     Arc::new(SyntheticSource::default()),
//!     SchedulerConfig::default(),
//! );
//! scheduler.check_for_fetch(0, 0.0, 2048.0).unwrap();
//! scheduler.drain_ready();
//!
//! let tiles: Vec<_> = best_tiles_covering(scheduler.store(), 0.0, 2048.0, 0).collect();
//! assert_eq!(tiles.len(), 4);
//! ```

pub mod address;
pub mod config;
pub mod listener;
pub mod logging;
pub mod scheduler;
pub mod selector;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod tile;
pub mod viewport;
