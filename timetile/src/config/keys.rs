//! Addressable configuration keys.
//!
//! Each key is named `section.key` and reads or writes one field of
//! [`ConfigFile`], validating the value on write.

use std::path::PathBuf;
use std::str::FromStr;

use super::file::{parse_level, parse_value, BackoffKind, ConfigError, ConfigFile};

/// A single configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    SchedulerMaxRetries,
    SchedulerBackoff,
    SchedulerInitialDelayMs,
    SchedulerMaxDelayMs,
    SchedulerMultiplier,
    SchedulerMinLevel,
    SourceBaseUrl,
    SourceTimeoutSecs,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 10] = [
    ConfigKey::SchedulerMaxRetries,
    ConfigKey::SchedulerBackoff,
    ConfigKey::SchedulerInitialDelayMs,
    ConfigKey::SchedulerMaxDelayMs,
    ConfigKey::SchedulerMultiplier,
    ConfigKey::SchedulerMinLevel,
    ConfigKey::SourceBaseUrl,
    ConfigKey::SourceTimeoutSecs,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Full name, `section.key`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SchedulerMaxRetries => "scheduler.max_retries",
            Self::SchedulerBackoff => "scheduler.backoff",
            Self::SchedulerInitialDelayMs => "scheduler.initial_delay_ms",
            Self::SchedulerMaxDelayMs => "scheduler.max_delay_ms",
            Self::SchedulerMultiplier => "scheduler.multiplier",
            Self::SchedulerMinLevel => "scheduler.min_level",
            Self::SourceBaseUrl => "source.base_url",
            Self::SourceTimeoutSecs => "source.timeout_secs",
            Self::LoggingLevel => "logging.level",
            Self::LoggingDirectory => "logging.directory",
        }
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        self.split().0
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or((name, ""))
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::SchedulerMaxRetries => config.scheduler.max_retries.to_string(),
            Self::SchedulerBackoff => config.scheduler.backoff.to_string(),
            Self::SchedulerInitialDelayMs => config.scheduler.initial_delay_ms.to_string(),
            Self::SchedulerMaxDelayMs => config.scheduler.max_delay_ms.to_string(),
            Self::SchedulerMultiplier => config.scheduler.multiplier.to_string(),
            Self::SchedulerMinLevel => config.scheduler.min_level.to_string(),
            Self::SourceBaseUrl => config.source.base_url.clone().unwrap_or_default(),
            Self::SourceTimeoutSecs => config.source.timeout_secs.to_string(),
            Self::LoggingLevel => config.logging.level.clone(),
            Self::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate `value` and store it. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let key = self.name();
        match self {
            Self::SchedulerMaxRetries => config.scheduler.max_retries = parse_value(key, value)?,
            Self::SchedulerBackoff => {
                config.scheduler.backoff = parse_value::<BackoffKind>(key, value)?
            }
            Self::SchedulerInitialDelayMs => {
                config.scheduler.initial_delay_ms = parse_value(key, value)?
            }
            Self::SchedulerMaxDelayMs => config.scheduler.max_delay_ms = parse_value(key, value)?,
            Self::SchedulerMultiplier => {
                let multiplier: f64 = parse_value(key, value)?;
                if !multiplier.is_finite() || multiplier < 1.0 {
                    return Err(ConfigError::invalid(key, value, "must be at least 1.0"));
                }
                config.scheduler.multiplier = multiplier;
            }
            Self::SchedulerMinLevel => config.scheduler.min_level = parse_level(key, value)?,
            Self::SourceBaseUrl => {
                let value = value.trim();
                config.source.base_url = if value.is_empty() {
                    None
                } else if value.starts_with("http://") || value.starts_with("https://") {
                    Some(value.to_string())
                } else {
                    return Err(ConfigError::invalid(key, value, "must be an http(s) URL"));
                };
            }
            Self::SourceTimeoutSecs => {
                let secs: u64 = parse_value(key, value)?;
                if secs == 0 {
                    return Err(ConfigError::invalid(key, value, "must be positive"));
                }
                config.source.timeout_secs = secs;
            }
            Self::LoggingLevel => {
                let value = value.trim();
                tracing_subscriber::EnvFilter::try_new(value)
                    .map_err(|e| ConfigError::invalid(key, value, e.to_string()))?;
                config.logging.level = value.to_string();
            }
            Self::LoggingDirectory => {
                let value = value.trim();
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
        assert_eq!(
            "Scheduler.Max_Retries".parse::<ConfigKey>().unwrap(),
            ConfigKey::SchedulerMaxRetries
        );
        assert!(matches!(
            "scheduler.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_section_and_key_name() {
        let key = ConfigKey::SourceTimeoutSecs;
        assert_eq!(key.section(), "source");
        assert_eq!(key.key_name(), "timeout_secs");
    }

    #[test]
    fn test_keys_are_grouped_by_section() {
        let sections: Vec<&str> = ConfigKey::all().iter().map(|k| k.section()).collect();
        let mut seen: Vec<&str> = Vec::new();
        for section in sections {
            if seen.last() != Some(&section) {
                assert!(!seen.contains(&section), "section {} split", section);
                seen.push(section);
            }
        }
        assert_eq!(seen, vec!["scheduler", "source", "logging"]);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();
        ConfigKey::SchedulerBackoff
            .set(&mut config, "Fixed")
            .unwrap();
        assert_eq!(ConfigKey::SchedulerBackoff.get(&config), "fixed");

        ConfigKey::SourceBaseUrl
            .set(&mut config, "https://example.org/tiles")
            .unwrap();
        assert_eq!(
            ConfigKey::SourceBaseUrl.get(&config),
            "https://example.org/tiles"
        );

        ConfigKey::SourceBaseUrl.set(&mut config, "").unwrap();
        assert_eq!(config.source.base_url, None);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::SchedulerBackoff.set(&mut config, "random").is_err());
        assert!(ConfigKey::SchedulerMultiplier.set(&mut config, "0.5").is_err());
        assert!(ConfigKey::SchedulerMultiplier.set(&mut config, "NaN").is_err());
        assert!(ConfigKey::SchedulerMinLevel.set(&mut config, "100").is_err());
        assert!(ConfigKey::SourceTimeoutSecs.set(&mut config, "0").is_err());
        assert!(ConfigKey::SourceBaseUrl.set(&mut config, "ftp://x").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "timetile=loud").is_err());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_logging_level_accepts_directives() {
        let mut config = ConfigFile::default();
        ConfigKey::LoggingLevel
            .set(&mut config, "warn,timetile=debug")
            .unwrap();
        assert_eq!(config.logging.level, "warn,timetile=debug");
    }
}
