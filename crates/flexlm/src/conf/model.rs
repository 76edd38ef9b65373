//! Model — MonitorConfig and related structs.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineOptions;
use crate::source::TailOptions;
use super::timezone::parse_timezone;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid timezone {0:?}, expected UTC, Z or +HH:MM")]
    InvalidTimezone(String),

    #[error("{0}")]
    Invalid(String),
}

/// How the binary prints events on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::Invalid(format!("output must be text or json, got {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub log_file: String,
    pub timezone: String,
    pub report_parsing_errors: bool,
    pub report_unmatched_log_lines: bool,
    pub output: OutputFormat,
    pub tail: TailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    pub must_exist: bool,
    pub follow: bool,
    pub reopen: bool,
    pub start_at_end: bool,
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_file: "/var/log/flexlm/debug.log".to_string(),
            timezone: "UTC".to_string(),
            report_parsing_errors: false,
            report_unmatched_log_lines: false,
            output: OutputFormat::Text,
            tail: TailConfig::default(),
        }
    }
}

impl Default for TailConfig {
    fn default() -> Self {
        let defaults = TailOptions::default();
        Self {
            must_exist: defaults.must_exist,
            follow: defaults.follow,
            reopen: defaults.reopen,
            start_at_end: defaults.start_at_end,
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
        }
    }
}

impl MonitorConfig {
    /// Engine options derived from this config; fails on a bad timezone.
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        Ok(EngineOptions::default()
            .with_timezone(parse_timezone(&self.timezone)?)
            .report_parsing_errors(self.report_parsing_errors)
            .report_unmatched_log_lines(self.report_unmatched_log_lines))
    }
}

impl TailConfig {
    pub fn tail_options(&self) -> TailOptions {
        TailOptions {
            must_exist: self.must_exist,
            follow: self.follow,
            reopen: self.reopen,
            start_at_end: self.start_at_end,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("tail.poll_interval_ms must be > 0".to_string()));
        }
        Ok(())
    }
}
