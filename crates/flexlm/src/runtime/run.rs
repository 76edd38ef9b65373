//! Run — tail the configured log and print events until it ends or Ctrl-C.

use std::io::Write;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::conf::{MonitorConfig, OutputFormat};
use crate::engine::tail_log;
use crate::parser::{Direction, Event};

pub async fn run(config: MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let options = config.engine_options()?;
    let shutdown = CancellationToken::new();

    let mut events = tail_log(
        &config.log_file,
        options,
        config.tail.tail_options(),
        Some(shutdown.clone()),
    )
    .await
    .map_err(|e| {
        error!("Failed to open {}: {}", config.log_file, e);
        e
    })?;

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, stopping"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        signal.cancel();
    });

    let stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        let line = format_event(&event, config.output)?;
        let mut out = stdout.lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
    }

    let reason = events.join().await;
    let snapshot = events.metrics().snapshot();
    info!(
        reason = ?reason,
        metrics = %serde_json::to_string(&snapshot)?,
        "Log monitor finished"
    );
    Ok(())
}

/// Render one event as a stdout line.
pub fn format_event(event: &Event, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string(event),
        OutputFormat::Text => Ok(format_text(event)),
    }
}

fn format_text(event: &Event) -> String {
    let mut line = match event.direction {
        Direction::Unmatched => format!("Unmatched: {}", event.raw_line),
        direction => format!(
            "{} of {} for {} on {}",
            direction.label(),
            event.license_name.as_deref().unwrap_or("?"),
            event.username.as_deref().unwrap_or("?"),
            event.machine.as_deref().unwrap_or("?"),
        ),
    };
    if let Some(err) = &event.error {
        line.push_str(&format!(" ({})", err));
    }
    line
}
