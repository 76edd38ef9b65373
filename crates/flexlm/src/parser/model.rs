use std::str::FromStr;
use thiserror::Error;
use serde::Serialize;
use chrono::{DateTime, FixedOffset};
use super::serde_utils::serialize_error_message;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Line did not match any license activity shape
    Unmatched,
    /// Check-out request refused by the server
    Denied,
    /// License returned to the pool
    CheckIn,
    /// License taken from the pool
    CheckOut,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Unmatched => "unmatched",
            Direction::Denied => "denied",
            Direction::CheckIn => "check_in",
            Direction::CheckOut => "check_out",
        }
    }

    /// Human-readable label used by the text output.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Unmatched => "Unmatched",
            Direction::Denied => "Denied check-out",
            Direction::CheckIn => "Check-in",
            Direction::CheckOut => "Check-out",
        }
    }
}

impl FromStr for Direction {
    type Err = EventError;

    /// Maps the server keyword (`IN`, `OUT`, `DENIED`) to a direction.
    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        match keyword {
            "IN" => Ok(Direction::CheckIn),
            "OUT" => Ok(Direction::CheckOut),
            "DENIED" => Ok(Direction::Denied),
            other => Err(EventError::InvalidDirection(other.to_string())),
        }
    }
}

/// Per-line failure carried inside an [`Event`].
///
/// None of these stop the stream; they only describe what went wrong with
/// a single line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("invalid timestamp {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("unmatched log line")]
    UnmatchedLine,

    #[error("direction [{0}] invalid")]
    InvalidDirection(String),

    /// Trailing parenthesized note the server attached to the line
    #[error("{0}")]
    Reported(String),
}

impl EventError {
    pub fn parse(input: impl Into<String>, reason: impl ToString) -> Self {
        EventError::Parse {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, EventError::Parse { .. })
    }
}

/// One classified log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Resolved date-time, absent when no anchor was available
    pub when: Option<DateTime<FixedOffset>>,

    pub direction: Direction,

    /// Service tag from the line prefix (`adskflex`, `lmgrd`)
    pub service: Option<String>,

    pub license_name: Option<String>,
    pub username: Option<String>,
    pub machine: Option<String>,

    /// Serialized as its display message
    #[serde(serialize_with = "serialize_error_message")]
    pub error: Option<EventError>,

    /// Original text (always preserved)
    pub raw_line: String,
}

impl Event {
    /// Unmatched event carrying nothing but the raw line
    pub fn unmatched(raw_line: impl Into<String>) -> Self {
        Self {
            when: None,
            direction: Direction::Unmatched,
            service: None,
            license_name: None,
            username: None,
            machine: None,
            error: None,
            raw_line: raw_line.into(),
        }
    }

    /// Unmatched event describing why the line could not be used
    pub fn failed(raw_line: impl Into<String>, error: EventError) -> Self {
        Self {
            error: Some(error),
            ..Self::unmatched(raw_line)
        }
    }
}
