//! Boot — logging init and config load.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::MonitorConfig;

/// Initialise the tracing / logging subsystem.
///
/// Logs go to stderr; stdout is reserved for events.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flexlm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate config. The first command-line argument, if any,
/// replaces the configured log path.
pub fn boot() -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    info!("Starting FlexNet log monitor v{}", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig::load()?.with_log_file(std::env::args().nth(1));

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!(
        log_file = %config.log_file,
        timezone = %config.timezone,
        output = ?config.output,
        "Loaded configuration"
    );
    info!(
        "Reporting: parsing_errors={}, unmatched_log_lines={}",
        config.report_parsing_errors, config.report_unmatched_log_lines
    );

    Ok(config)
}
