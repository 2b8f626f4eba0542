//! timetile CLI - Command-line interface
//!
//! Drives the timetile fetch scheduler against a synthetic or HTTP data
//! source, and manages the configuration file.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use timetile::config::{config_file_path, ConfigFile};
use timetile::logging::{init_logging, LoggingGuard};

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "timetile", version, about = "Multi-resolution tile cache for time-series charts")]
struct Cli {
    /// Log filter (e.g. info, debug, timetile=trace); overrides RUST_LOG and logging.level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scripted pan/zoom session against synthetic data
    Simulate(SimulateArgs),

    /// Fetch one viewport from a tile server
    Fetch(FetchArgs),

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Set up logging: `--log-level`, then `RUST_LOG`, then the config file.
fn setup_logging(cli: &Cli, config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    let level = cli.log_level.clone().or_else(|| {
        std::env::var_os("RUST_LOG")
            .is_none()
            .then(|| config.logging.level.clone())
    });
    Ok(init_logging(
        level.as_deref(),
        config.logging.directory.as_deref(),
    )?)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.clone().unwrap_or_else(config_file_path);
    let config = ConfigFile::load_from(&config_path)?;
    let _guard = setup_logging(&cli, &config)?;
    tracing::debug!(config = %config_path.display(), "Loaded configuration");

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args, &config).await,
        Commands::Fetch(args) => commands::fetch::run(args, &config).await,
        Commands::Config { command } => commands::config::run(command, &config_path),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
