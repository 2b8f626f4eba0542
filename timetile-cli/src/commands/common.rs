//! Common types and utilities shared across CLI commands.

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use timetile::config::ConfigFile;
use timetile::scheduler::{Backoff, SchedulerConfig};
use timetile::tile::Tile;

/// Backoff selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum BackoffArg {
    /// Re-fetch as soon as a failure is seen
    Immediate,
    /// Wait the configured initial delay before every re-fetch
    Fixed,
    /// Double the delay after each failure, up to the configured cap
    Exponential,
}

/// Resolve scheduler settings from CLI args and config.
pub fn resolve_scheduler_config(
    cli_max_retries: Option<u32>,
    cli_backoff: Option<BackoffArg>,
    config: &ConfigFile,
) -> SchedulerConfig {
    // CLI takes precedence, then config
    let mut scheduler = config.scheduler_config();

    if let Some(max_retries) = cli_max_retries {
        scheduler.retry.max_retries = max_retries;
    }

    if let Some(backoff) = cli_backoff {
        let section = &config.scheduler;
        scheduler.retry.backoff = match backoff {
            BackoffArg::Immediate => Backoff::Immediate,
            BackoffArg::Fixed => Backoff::Fixed(Duration::from_millis(section.initial_delay_ms)),
            BackoffArg::Exponential => Backoff::Exponential {
                initial: Duration::from_millis(section.initial_delay_ms),
                max: Duration::from_millis(section.max_delay_ms),
                multiplier: section.multiplier,
            },
        };
    }

    scheduler
}

/// Fraction of `[min, max]` covered by `tiles` (1.0 for an empty range).
pub fn coverage<'a>(tiles: impl IntoIterator<Item = &'a Arc<Tile>>, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 1.0;
    }

    let covered: f64 = tiles
        .into_iter()
        .map(|tile| {
            let address = tile.address();
            (address.max_time().min(max) - address.min_time().max(min)).max(0.0)
        })
        .sum();

    (covered / span).min(1.0)
}

/// One-line description of a tile.
pub fn describe_tile(tile: &Tile) -> String {
    let address = tile.address();
    format!(
        "{:<12} [{}, {})  {} x{}",
        address.to_string(),
        address.min_time(),
        address.max_time(),
        tile.payload().kind(),
        tile.payload().len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use timetile::address::TileAddress;
    use timetile::scheduler::DEFAULT_MAX_RETRIES;
    use timetile::tile::TilePayload;

    fn tile(level: i32, offset: i64) -> Arc<Tile> {
        Arc::new(Tile::new(
            TileAddress::new(level, offset).unwrap(),
            TilePayload::Empty,
        ))
    }

    #[test]
    fn test_resolve_uses_config_by_default() {
        let config = ConfigFile::default();
        let scheduler = resolve_scheduler_config(None, None, &config);
        assert_eq!(scheduler, config.scheduler_config());
        assert_eq!(scheduler.retry.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_resolve_cli_overrides() {
        let config = ConfigFile::default();
        let scheduler = resolve_scheduler_config(Some(1), Some(BackoffArg::Immediate), &config);
        assert_eq!(scheduler.retry.max_retries, 1);
        assert_eq!(scheduler.retry.backoff, Backoff::Immediate);
    }

    #[test]
    fn test_coverage() {
        let tiles = vec![tile(0, 0), tile(0, 1)];
        assert_eq!(coverage(&tiles, 0.0, 1024.0), 1.0);
        assert_eq!(coverage(&tiles, 0.0, 2048.0), 0.5);
        assert_eq!(coverage(&tiles[..1], 256.0, 768.0), 0.5);
        assert_eq!(coverage(&[], 0.0, 100.0), 0.0);
        assert_eq!(coverage(&[], 5.0, 5.0), 1.0);
    }

    #[test]
    fn test_describe_tile() {
        let text = describe_tile(&tile(1, 2));
        assert!(text.starts_with("L1@2"));
        assert!(text.contains("[2048, 3072)"));
        assert!(text.contains("empty x0"));
    }
}
