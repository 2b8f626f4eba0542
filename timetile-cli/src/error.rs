//! CLI error type.

use std::fmt;

use timetile::config::ConfigError;
use timetile::logging::LoggingError;
use timetile::scheduler::SchedulerError;
use timetile::source::FetchError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or missing configuration, with a message for the user.
    Config(String),
    /// Config file could not be read or written.
    ConfigFile(ConfigError),
    /// Logging could not be set up.
    Logging(LoggingError),
    /// A viewport was rejected.
    Scheduler(SchedulerError),
    /// The data source could not be created.
    Source(FetchError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Scheduler(e) => write!(f, "{}", e),
            CliError::Source(e) => write!(f, "Data source error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<SchedulerError> for CliError {
    fn from(e: SchedulerError) -> Self {
        CliError::Scheduler(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_message() {
        let err = CliError::Config("no base URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: no base URL");
    }

    #[test]
    fn test_from_scheduler_error() {
        let err: CliError = SchedulerError::InvalidViewport { min: 2.0, max: 1.0 }.into();
        assert!(err.to_string().contains("Invalid viewport"));
    }
}
