//! Fetch command - load one viewport from a tile server and list the result.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use timetile::address::{offset_range, TileAddress};
use timetile::config::ConfigFile;
use timetile::scheduler::{FetchScheduler, SchedulerError};
use timetile::selector::best_tiles_covering;
use timetile::source::HttpSource;
use timetile::tile::TileState;
use timetile::viewport::Viewport;

use super::common::{coverage, describe_tile, resolve_scheduler_config, BackoffArg};
use crate::error::CliError;

/// Most tiles one fetch command will request.
const MAX_FETCH_TILES: i64 = 4096;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Start of the viewport
    #[arg(long, allow_hyphen_values = true)]
    pub min: f64,

    /// End of the viewport (exclusive)
    #[arg(long, allow_hyphen_values = true)]
    pub max: f64,

    /// Level to fetch at (derived from the viewport width if omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub level: Option<i32>,

    /// Tile server base URL (overrides source.base_url)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds (overrides source.timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Override scheduler.max_retries
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Override scheduler.backoff
    #[arg(long, value_enum)]
    pub backoff: Option<BackoffArg>,
}

/// Number of tiles `viewport` covers, refusing anything over [`MAX_FETCH_TILES`].
fn check_tile_count(viewport: &Viewport) -> Result<i64, CliError> {
    let (first, last) = offset_range(viewport.level, viewport.min, viewport.max)
        .map_err(SchedulerError::from)?;
    let count = last.saturating_sub(first).saturating_add(1);
    if count > MAX_FETCH_TILES {
        return Err(CliError::Config(format!(
            "[{}, {}) at level {} covers {} tiles (limit {}). \
             Use a coarser --level or a narrower range.",
            viewport.min, viewport.max, viewport.level, count, MAX_FETCH_TILES
        )));
    }
    Ok(count)
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.source.base_url.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No tile server configured. \
                 Set source.base_url with 'timetile config set' or use --base-url."
                    .to_string(),
            )
        })?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.source_timeout());

    let source = HttpSource::with_timeout(base_url, timeout)?;
    let viewport = match args.level {
        Some(level) => Viewport::new(level, args.min, args.max),
        None => Viewport::from_range(args.min, args.max),
    };
    let tile_count = check_tile_count(&viewport)?;
    tracing::debug!(tile_count, level = viewport.level, "Viewport checked");

    let scheduler_config = resolve_scheduler_config(args.max_retries, args.backoff, config);
    println!(
        "Fetching [{}, {}) at level {} from {}",
        viewport.min,
        viewport.max,
        viewport.level,
        source.base_url()
    );

    let mut scheduler = FetchScheduler::new(Arc::new(source), scheduler_config);
    let issued = scheduler.check_for_fetch(viewport.level, viewport.min, viewport.max)?;
    tracing::debug!(issued, "Waiting for fetches");
    scheduler.run_until_idle().await;

    println!();
    println!("{}", style("Tiles").bold());
    let tiles = best_tiles_covering(scheduler.store(), viewport.min, viewport.max, viewport.level);
    for tile in tiles.clone() {
        println!("  {}", describe_tile(tile));
    }

    if let Some(window) = scheduler.window() {
        for offset in window.min_offset..=window.max_offset {
            let Ok(address) = TileAddress::new(window.level, offset) else {
                continue;
            };
            if scheduler.state(address) == Some(TileState::Abandoned) {
                println!(
                    "  {:<12} {}",
                    address.to_string(),
                    style(format!("abandoned after {} failures", scheduler.failures(address)))
                        .red()
                );
            }
        }
    }

    println!(
        "  coverage: {:.1}%",
        coverage(tiles, viewport.min, viewport.max) * 100.0
    );
    println!();
    println!("{}", style("Scheduler").bold());
    println!("{}", scheduler.snapshot());

    Ok(())
}
