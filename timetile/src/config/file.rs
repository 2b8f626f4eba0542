//! INI configuration file.
//!
//! ```ini
//! [scheduler]
//! max_retries = 5
//! backoff = exponential
//! initial_delay_ms = 100
//! max_delay_ms = 30000
//! multiplier = 2.0
//! min_level = -64
//!
//! [source]
//! base_url = http://localhost:8080/tiles/channel
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! directory = /var/log/timetile
//! ```
//!
//! Missing keys keep their defaults. A missing file is the default config.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::address::{MAX_LEVEL, MIN_LEVEL};
use crate::scheduler::{
    Backoff, RetryPolicy, SchedulerConfig, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS,
    DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_RETRIES,
};

/// Application name, used for the config directory.
const APP_DIR: &str = "timetile";

/// Config file name.
const CONFIG_FILE: &str = "config.ini";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors loading, saving or editing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Path of the user's config file.
///
/// `<config_dir>/timetile/config.ini`, falling back to the working directory
/// when the platform has no config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Backoff strategy names accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    Immediate,
    Fixed,
    Exponential,
}

impl FromStr for BackoffKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            _ => Err("expected immediate, fixed or exponential".to_string()),
        }
    }
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Immediate => "immediate",
            Self::Fixed => "fixed",
            Self::Exponential => "exponential",
        };
        f.write_str(name)
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSection {
    pub max_retries: u32,
    pub backoff: BackoffKind,
    /// Initial delay for exponential backoff, or the delay for fixed backoff.
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub min_level: i32,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: BackoffKind::Immediate,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_SECS * 1000,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            min_level: MIN_LEVEL,
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSection {
    /// Tile server base URL; tiles are fetched from `<base_url>/<level>.<offset>.json`.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSection {
    /// Filter directive (`info`, `timetile=debug`, ...).
    pub level: String,
    /// Directory for daily rolling log files; console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub source: SourceSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in super::ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in super::ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Retry policy described by the `[scheduler]` section.
    pub fn retry_policy(&self) -> RetryPolicy {
        let section = &self.scheduler;
        let backoff = match section.backoff {
            BackoffKind::Immediate => Backoff::Immediate,
            BackoffKind::Fixed => Backoff::Fixed(Duration::from_millis(section.initial_delay_ms)),
            BackoffKind::Exponential => Backoff::Exponential {
                initial: Duration::from_millis(section.initial_delay_ms),
                max: Duration::from_millis(section.max_delay_ms),
                multiplier: section.multiplier,
            },
        };
        RetryPolicy::new(section.max_retries, backoff)
    }

    /// Scheduler settings described by the `[scheduler]` section.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            retry: self.retry_policy(),
            min_level: self.scheduler.min_level,
        }
    }

    /// HTTP timeout from the `[source]` section.
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }
}

/// Parse `value` as `T`, reporting failures against `key`.
pub(crate) fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, value, e.to_string()))
}

/// Parse a level, rejecting values outside the supported range.
pub(crate) fn parse_level(key: &str, value: &str) -> Result<i32, ConfigError> {
    let level: i32 = parse_value(key, value)?;
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(ConfigError::invalid(
            key,
            value,
            format!("must be between {} and {}", MIN_LEVEL, MAX_LEVEL),
        ));
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.scheduler.max_retries = 2;
        config.scheduler.backoff = BackoffKind::Fixed;
        config.scheduler.initial_delay_ms = 250;
        config.source.base_url = Some("http://localhost:8080/tiles".to_string());
        config.logging.directory = Some(PathBuf::from("/tmp/timetile-logs"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[scheduler]\nmax_retries = 9\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.scheduler.max_retries, 9);
        assert_eq!(config.scheduler.backoff, BackoffKind::Immediate);
        assert_eq!(config.source, SourceSection::default());
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[scheduler]\nmax_retries = lots\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "scheduler.max_retries");
                assert_eq!(value, "lots");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_policy_from_sections() {
        let mut config = ConfigFile::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());

        config.scheduler.backoff = BackoffKind::Immediate;
        config.scheduler.max_retries = 3;
        assert_eq!(config.retry_policy(), RetryPolicy::new(3, Backoff::Immediate));

        config.scheduler.backoff = BackoffKind::Fixed;
        config.scheduler.initial_delay_ms = 500;
        assert_eq!(
            config.retry_policy().backoff,
            Backoff::Fixed(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_scheduler_config() {
        let mut config = ConfigFile::default();
        config.scheduler.min_level = -10;
        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.min_level, -10);
        assert_eq!(scheduler.retry.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_parse_level_range() {
        assert_eq!(parse_level("scheduler.min_level", "-12").unwrap(), -12);
        assert!(parse_level("scheduler.min_level", "65").is_err());
        assert!(parse_level("scheduler.min_level", "x").is_err());
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("timetile/config.ini"));
    }
}
