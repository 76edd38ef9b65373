use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::{Direction, EventError};

/// Counters for emitted events, by direction
#[derive(Debug, Default)]
pub struct DirectionMetrics {
    pub check_out: AtomicU64,
    pub check_in: AtomicU64,
    pub denied: AtomicU64,
    pub unmatched: AtomicU64,
}

/// Error counters by kind
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub parse: AtomicU64,
    pub unmatched_line: AtomicU64,
    pub invalid_direction: AtomicU64,
    pub reported: AtomicU64,
}

/// Metrics for one engine.
///
/// Written by the producer task, read from anywhere through `snapshot()`.
/// All operations use `Ordering::Relaxed`; a snapshot is not transactional
/// across fields.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub lines: AtomicU64,
    pub anchor_updates: AtomicU64,
    pub emitted: AtomicU64,
    /// Lines that produced nothing because reporting was disabled
    pub dropped: AtomicU64,
    pub directions: DirectionMetrics,
    pub errors: ErrorMetrics,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_anchor_update(&self) {
        self.anchor_updates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an error, whether or not the line ends up emitted
    #[inline]
    pub fn record_error(&self, error: &EventError) {
        let counter = match error {
            EventError::Parse { .. } => &self.errors.parse,
            EventError::UnmatchedLine => &self.errors.unmatched_line,
            EventError::InvalidDirection(_) => &self.errors.invalid_direction,
            EventError::Reported(_) => &self.errors.reported,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_emitted(&self, direction: Direction) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let counter = match direction {
            Direction::CheckOut => &self.directions.check_out,
            Direction::CheckIn => &self.directions.check_in,
            Direction::Denied => &self.directions.denied,
            Direction::Unmatched => &self.directions.unmatched,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines: self.lines.load(Ordering::Relaxed),
            anchor_updates: self.anchor_updates.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),

            check_outs: self.directions.check_out.load(Ordering::Relaxed),
            check_ins: self.directions.check_in.load(Ordering::Relaxed),
            denials: self.directions.denied.load(Ordering::Relaxed),
            unmatched: self.directions.unmatched.load(Ordering::Relaxed),

            parse_errors: self.errors.parse.load(Ordering::Relaxed),
            unmatched_lines: self.errors.unmatched_line.load(Ordering::Relaxed),
            invalid_directions: self.errors.invalid_direction.load(Ordering::Relaxed),
            reported_notes: self.errors.reported.load(Ordering::Relaxed),
        }
    }
}

/// Read-only copy of [`EngineMetrics`], cheap to clone and log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub lines: u64,
    pub anchor_updates: u64,
    pub emitted: u64,
    pub dropped: u64,

    // Emitted events by direction
    pub check_outs: u64,
    pub check_ins: u64,
    pub denials: u64,
    pub unmatched: u64,

    // Errors seen, emitted or not
    pub parse_errors: u64,
    pub unmatched_lines: u64,
    pub invalid_directions: u64,
    pub reported_notes: u64,
}
