//! Grammar — compiled line shapes of the FlexNet debug log.
//!
//! Every recognized line starts with the same prefix:
//! `<ws>*H:MM:SS (adskflex|lmgrd) `. What follows decides the shape:
//!
//! 1. `FlexNet Licensing ... (M/D/YYYY)`  service started, sets the anchor
//! 2. `TIMESTAMP M/D/YYYY`                 periodic marker, sets the anchor
//! 3. `IN|OUT|DENIED: "lic" user@host`     license activity
//! 4. anything else                        prefix only
//!
//! The patterns are compiled once per process and hold no mutable state.

use std::sync::LazyLock;
use regex::{Captures, Regex};

/// Shared prefix: time of day and service tag.
const PREFIX: &str = r"^\s*(?P<time>[0-9]{1,2}:[0-9]{2}:[0-9]{2})\s+\((?P<service>adskflex|lmgrd)\)\s+";

/// Date as written by the server: month/day/year without padding.
const DATE: &str = r"[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}";

static PREFIX_ONLY: LazyLock<Regex> = LazyLock::new(|| compile(String::new()));

static STARTED: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"FlexNet\s+Licensing\s+.*\((?P<date>{DATE})\)\s*$"))
});

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"TIMESTAMP\s+(?P<date>{DATE})"))
});

static ACTIVITY: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?P<keyword>IN|OUT|DENIED):\s+"(?P<license>[^"]+)"\s+(?P<user>\S+)@(?P<machine>\S+)(\s+\((?P<note>.*)\))?\s*$"#
            .to_string(),
    )
});

fn compile(rest: String) -> Regex {
    Regex::new(&format!("{PREFIX}{rest}")).expect("line grammar patterns are valid")
}

/// Time of day and service tag shared by every recognized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix<'a> {
    pub time: &'a str,
    pub service: &'a str,
}

/// Check-in, check-out or denial fields, borrowed from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity<'a> {
    pub prefix: Prefix<'a>,
    /// Raw direction keyword (`IN`, `OUT`, `DENIED`)
    pub keyword: &'a str,
    pub license: &'a str,
    pub user: &'a str,
    pub machine: &'a str,
    /// Parenthesized trailer, if any and non-empty
    pub note: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape<'a> {
    /// `FlexNet Licensing ... (M/D/YYYY)`
    Started { prefix: Prefix<'a>, date: &'a str },
    /// `TIMESTAMP M/D/YYYY`
    Timestamp { prefix: Prefix<'a>, date: &'a str },
    Activity(Activity<'a>),
    /// Prefix matched, remainder did not
    Other(Prefix<'a>),
    /// Not even the prefix matched
    Unrecognized,
}

/// Classify a line. Shapes are tried in priority order and exactly one is returned.
pub fn classify(line: &str) -> LineShape<'_> {
    if let Some(caps) = STARTED.captures(line) {
        return LineShape::Started {
            prefix: prefix(&caps),
            date: group(&caps, "date"),
        };
    }

    if let Some(caps) = TIMESTAMP.captures(line) {
        return LineShape::Timestamp {
            prefix: prefix(&caps),
            date: group(&caps, "date"),
        };
    }

    if let Some(caps) = ACTIVITY.captures(line) {
        return LineShape::Activity(Activity {
            prefix: prefix(&caps),
            keyword: group(&caps, "keyword"),
            license: group(&caps, "license"),
            user: group(&caps, "user"),
            machine: group(&caps, "machine"),
            note: caps
                .name("note")
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty()),
        });
    }

    match PREFIX_ONLY.captures(line) {
        Some(caps) => LineShape::Other(prefix(&caps)),
        None => LineShape::Unrecognized,
    }
}

fn prefix<'a>(caps: &Captures<'a>) -> Prefix<'a> {
    Prefix {
        time: group(caps, "time"),
        service: group(caps, "service"),
    }
}

fn group<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map(|m| m.as_str()).unwrap_or_default()
}
