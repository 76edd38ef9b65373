//! Conf module — monitor configuration model, loading, and timezone parsing.

pub mod model;
pub mod load;
pub mod timezone;

pub use model::{ConfigError, MonitorConfig, OutputFormat, TailConfig};
pub use timezone::parse_timezone;
