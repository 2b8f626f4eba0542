//! Configuration.
//!
//! Settings live in an INI file at `<config_dir>/timetile/config.ini`.
//! [`ConfigFile`] is the parsed form; [`ConfigKey`] addresses one setting by
//! its `section.key` name for the CLI's `config get/set/list` commands.

mod file;
mod keys;

pub use file::{
    config_file_path, BackoffKind, ConfigError, ConfigFile, LoggingSection, SchedulerSection,
    SourceSection, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS,
};
pub use keys::ConfigKey;
