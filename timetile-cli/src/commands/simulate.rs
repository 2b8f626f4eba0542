//! Simulate command - drive the scheduler through a scripted pan/zoom session.
//!
//! Uses the synthetic source, so it needs no server. Failure injection and
//! latency show how retries and backoff behave.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use timetile::config::ConfigFile;
use timetile::listener::{ChannelListener, LoadEvent};
use timetile::scheduler::FetchScheduler;
use timetile::selector::best_tiles_covering;
use timetile::source::{SyntheticConfig, SyntheticSource, DEFAULT_POINTS_PER_TILE};
use timetile::viewport::{SharedViewport, Viewport, ViewportProvider};

use super::common::{coverage, resolve_scheduler_config, BackoffArg};
use crate::error::CliError;

/// Arguments for the simulate command.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Start of the initial viewport
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub start: f64,

    /// Width of the initial viewport
    #[arg(long, default_value_t = 8192.0)]
    pub width: f64,

    /// Number of pan/zoom steps after the initial view
    #[arg(long, default_value_t = 12)]
    pub steps: usize,

    /// Fraction of the viewport width moved per pan
    #[arg(long, default_value_t = 0.25)]
    pub pan: f64,

    /// Probability (0.0 - 1.0) that any fetch attempt fails
    #[arg(long, default_value_t = 0.0)]
    pub fail_rate: f64,

    /// Fail every tile this many times before it succeeds
    #[arg(long, default_value_t = 0)]
    pub fail_first: u32,

    /// Simulated latency per fetch, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Seed for failure injection
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Samples generated per tile
    #[arg(long, default_value_t = DEFAULT_POINTS_PER_TILE)]
    pub points: usize,

    /// Override scheduler.max_retries
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Override scheduler.backoff
    #[arg(long, value_enum)]
    pub backoff: Option<BackoffArg>,
}

/// One step of the scripted session.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Move {
    PanRight,
    PanLeft,
    ZoomIn,
    ZoomOut,
}

const SCRIPT: [Move; 6] = [
    Move::PanRight,
    Move::PanRight,
    Move::ZoomIn,
    Move::PanLeft,
    Move::ZoomOut,
    Move::ZoomOut,
];

impl Move {
    fn apply(self, viewport: &Viewport, pan: f64) -> Viewport {
        match self {
            Move::PanRight => viewport.panned(viewport.width() * pan),
            Move::PanLeft => viewport.panned(-viewport.width() * pan),
            Move::ZoomIn => viewport.zoomed(0.5),
            Move::ZoomOut => viewport.zoomed(2.0),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Move::PanRight => "pan right",
            Move::PanLeft => "pan left",
            Move::ZoomIn => "zoom in",
            Move::ZoomOut => "zoom out",
        }
    }
}

fn validate(args: &SimulateArgs) -> Result<(), CliError> {
    if !args.width.is_finite() || args.width <= 0.0 {
        return Err(CliError::Config(format!(
            "--width must be a positive number, got {}",
            args.width
        )));
    }
    if !(0.0..=1.0).contains(&args.fail_rate) {
        return Err(CliError::Config(format!(
            "--fail-rate must be between 0.0 and 1.0, got {}",
            args.fail_rate
        )));
    }
    Ok(())
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    validate(&args)?;

    let source = Arc::new(SyntheticSource::new(SyntheticConfig {
        points_per_tile: args.points,
        latency: Duration::from_millis(args.latency_ms),
        fail_first: args.fail_first,
        failure_rate: args.fail_rate,
        seed: args.seed,
    }));
    let scheduler_config = resolve_scheduler_config(args.max_retries, args.backoff, config);
    tracing::info!(retry = ?scheduler_config.retry, "Starting simulation");

    let viewport = SharedViewport::new(Viewport::from_range(args.start, args.start + args.width));
    let mut scheduler = FetchScheduler::new(source.clone(), scheduler_config)
        .with_viewport_provider(Arc::new(viewport.clone()));
    let (listener, mut events) = ChannelListener::new();
    scheduler.subscribe(Arc::new(listener));

    let progress = ProgressBar::new(args.steps as u64 + 1);
    progress.set_style(ProgressStyle::default_bar());

    println!(
        "{}",
        style(format!(
            "{:>4}  {:<10} {:>5}  {:<24} {:>6} {:>6} {:>6}  {:>5} {:>8}",
            "step", "action", "level", "viewport", "issued", "loaded", "failed", "tiles", "covered"
        ))
        .bold()
    );

    for step in 0..=args.steps {
        let action = if step == 0 {
            "start"
        } else {
            let next = SCRIPT[(step - 1) % SCRIPT.len()];
            viewport.update(|v| next.apply(v, args.pan));
            next.name()
        };

        let issued = scheduler.check_viewport()?;
        scheduler.run_until_idle().await;

        let (mut loaded, mut failed) = (0, 0);
        while let Ok(event) = events.try_recv() {
            match event {
                LoadEvent::Success => loaded += 1,
                LoadEvent::Failure => failed += 1,
            }
        }

        let current = viewport.viewport();
        let tiles = best_tiles_covering(scheduler.store(), current.min, current.max, current.level);
        let tile_count = tiles.clone().count();
        let covered = coverage(tiles, current.min, current.max);

        progress.println(format!(
            "{:>4}  {:<10} {:>5}  {:<24} {:>6} {:>6} {:>6}  {:>5} {:>7.1}%",
            step,
            action,
            current.level,
            format!("[{:.0}, {:.0})", current.min, current.max),
            issued,
            loaded,
            failed,
            tile_count,
            covered * 100.0
        ));
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!();
    println!("{}", style("Scheduler").bold());
    println!("{}", scheduler.snapshot());
    println!("source invocations: {}", source.invocations());
    println!("zoom in allowed:    {}", scheduler.allows_zoom_in());

    Ok(())
}
