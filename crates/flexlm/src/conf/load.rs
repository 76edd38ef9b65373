//! Load — config loading from file and environment variables.

use std::path::Path;
use tracing::{info, warn};

use super::model::{ConfigError, MonitorConfig, OutputFormat};
use super::timezone::parse_timezone;

const DEFAULT_CONFIG_PATH: &str = "/etc/flexlm/monitor.toml";

impl MonitorConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("FLEXLM_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            info!("Config file not found at {}, using environment variables", config_path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Overlay values from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FLEXLM_LOG_FILE") {
            self.log_file = path;
        }
        if let Some(tz) = lookup("FLEXLM_TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(flag) = lookup("FLEXLM_REPORT_PARSING_ERRORS") {
            self.report_parsing_errors = parse_flag("FLEXLM_REPORT_PARSING_ERRORS", &flag)?;
        }
        if let Some(flag) = lookup("FLEXLM_REPORT_UNMATCHED") {
            self.report_unmatched_log_lines = parse_flag("FLEXLM_REPORT_UNMATCHED", &flag)?;
        }
        if let Some(output) = lookup("FLEXLM_OUTPUT") {
            self.output = output.parse::<OutputFormat>()?;
        }
        Ok(())
    }

    /// A positional log path replaces the configured one
    pub fn with_log_file(mut self, path: Option<String>) -> Self {
        if let Some(path) = path {
            self.log_file = path;
        }
        self
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_file.trim().is_empty() {
            return Err(ConfigError::Invalid("log_file must not be empty".to_string()));
        }
        parse_timezone(&self.timezone)?;
        self.tail.validate()?;

        if !self.tail.must_exist && !Path::new(&self.log_file).exists() {
            warn!(path = %self.log_file, "log file does not exist yet, waiting for it to appear");
        }
        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{} must be a boolean, got {:?}", key, raw))),
    }
}
