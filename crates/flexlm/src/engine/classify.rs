//! Classify — per-line classification and reporting policy.

use std::sync::Arc;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::{debug, trace, warn};

use crate::parser::grammar::{Activity, Prefix};
use crate::parser::{classify, Direction, EngineMetrics, Event, EventError, LineShape, TimestampAnchor};

/// Reporting and time zone options for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Offset used for every resolved timestamp
    pub timezone: FixedOffset,
    /// Emit malformed-timestamp lines as error events instead of dropping them
    pub report_parsing_errors: bool,
    /// Emit lines that match no known shape as `Unmatched` events
    pub report_unmatched_log_lines: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timezone: Utc.fix(),
            report_parsing_errors: false,
            report_unmatched_log_lines: false,
        }
    }
}

impl EngineOptions {
    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn report_parsing_errors(mut self, enabled: bool) -> Self {
        self.report_parsing_errors = enabled;
        self
    }

    pub fn report_unmatched_log_lines(mut self, enabled: bool) -> Self {
        self.report_unmatched_log_lines = enabled;
        self
    }
}

/// Stateful line classifier.
///
/// Holds the timestamp anchor for one tailing session. Feed it lines in file
/// order; each line yields at most one event.
pub struct LogEventEngine {
    options: EngineOptions,
    anchor: TimestampAnchor,
    metrics: Arc<EngineMetrics>,
}

impl LogEventEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            anchor: TimestampAnchor::new(options.timezone),
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Current anchor, if a marker line has been seen
    pub fn anchor(&self) -> Option<DateTime<FixedOffset>> {
        self.anchor.current()
    }

    /// Classify one raw line. `None` means the line produced no event
    /// (marker line, or a failure the options say to drop).
    pub fn process_line(&mut self, raw: &str) -> Option<Event> {
        self.metrics.record_line();

        let event = match classify(raw) {
            LineShape::Started { prefix, date } | LineShape::Timestamp { prefix, date } => {
                self.on_marker(raw, prefix, date)
            }
            LineShape::Activity(activity) => self.on_activity(raw, activity),
            LineShape::Other(prefix) => self.on_unmatched(raw, Some(prefix)),
            LineShape::Unrecognized => self.on_unmatched(raw, None),
        };

        if let Some(ref e) = event {
            self.metrics.record_emitted(e.direction);
        }
        event
    }

    fn on_marker(&mut self, raw: &str, prefix: Prefix<'_>, date: &str) -> Option<Event> {
        match self.anchor.mark(date, prefix.time) {
            Ok(anchor) => {
                self.metrics.record_anchor_update();
                debug!(%anchor, service = prefix.service, "timestamp anchor updated");
                None
            }
            Err(e) => self.parse_failure(raw, Some(prefix), e),
        }
    }

    fn on_activity(&mut self, raw: &str, activity: Activity<'_>) -> Option<Event> {
        let when = match self.anchor.resolve(activity.prefix.time) {
            Ok(when) => when,
            Err(e) => return self.parse_failure(raw, Some(activity.prefix), e),
        };

        if when.is_none() {
            trace!(line = raw, "activity before any timestamp anchor");
        }

        let direction = match activity.keyword.parse::<Direction>() {
            Ok(direction) => direction,
            Err(e) => {
                // Only reachable if the grammar and Direction drift apart
                warn!(keyword = activity.keyword, "direction keyword matched grammar but is unknown");
                self.metrics.record_error(&e);
                return Some(Event {
                    when,
                    service: Some(activity.prefix.service.to_string()),
                    ..Event::failed(raw, e)
                });
            }
        };

        let error = activity.note.map(|note| EventError::Reported(note.to_string()));
        if let Some(ref e) = error {
            self.metrics.record_error(e);
        }

        trace!(direction = direction.as_str(), license = activity.license, "license activity");

        Some(Event {
            when,
            direction,
            service: Some(activity.prefix.service.to_string()),
            license_name: Some(activity.license.to_string()),
            username: Some(activity.user.to_string()),
            machine: Some(activity.machine.to_string()),
            error,
            raw_line: raw.to_string(),
        })
    }

    fn on_unmatched(&mut self, raw: &str, prefix: Option<Prefix<'_>>) -> Option<Event> {
        let mut when = None;

        if let Some(p) = prefix {
            match self.anchor.refresh(p.time) {
                Ok(refreshed) => when = refreshed,
                Err(e) if self.options.report_parsing_errors => {
                    return self.parse_failure(raw, prefix, e);
                }
                // Counted once below, as an unmatched line
                Err(e) => debug!(error = %e, "prefix time unparsable, treating line as unmatched"),
            }
        }

        let error = EventError::UnmatchedLine;
        self.metrics.record_error(&error);

        if !self.options.report_unmatched_log_lines {
            self.metrics.record_dropped();
            return None;
        }

        Some(Event {
            when,
            service: prefix.map(|p| p.service.to_string()),
            ..Event::failed(raw, error)
        })
    }

    fn parse_failure(&self, raw: &str, prefix: Option<Prefix<'_>>, error: EventError) -> Option<Event> {
        self.metrics.record_error(&error);

        if !self.options.report_parsing_errors {
            debug!(%error, "dropping line with malformed timestamp");
            self.metrics.record_dropped();
            return None;
        }

        Some(Event {
            service: prefix.map(|p| p.service.to_string()),
            ..Event::failed(raw, error)
        })
    }
}
