//! Anchor — rolling date basis for time-of-day-only log lines.
//!
//! FlexNet only writes a full date on service start and on periodic
//! `TIMESTAMP` lines; everything else carries a bare `H:MM:SS`. The anchor
//! remembers the last full date-time so those lines can be placed on a day.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use super::model::EventError;

const MARKER_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Owned by exactly one engine; never shared between sessions.
#[derive(Debug, Clone)]
pub struct TimestampAnchor {
    current: Option<DateTime<FixedOffset>>,
    timezone: FixedOffset,
}

impl TimestampAnchor {
    pub fn new(timezone: FixedOffset) -> Self {
        Self {
            current: None,
            timezone,
        }
    }

    pub fn current(&self) -> Option<DateTime<FixedOffset>> {
        self.current
    }

    /// Replace the anchor from a marker line (`M/D/YYYY` date, `H:MM:SS` time).
    ///
    /// On failure the anchor is left untouched.
    pub fn mark(&mut self, date: &str, time: &str) -> Result<DateTime<FixedOffset>, EventError> {
        let input = format!("{date} {time}");
        let naive = NaiveDateTime::parse_from_str(&input, MARKER_FORMAT)
            .map_err(|e| EventError::parse(input.as_str(), e))?;
        reject_leap_second(naive.time(), &input)?;
        let resolved = self.localize(naive, &input)?;
        self.current = Some(resolved);
        Ok(resolved)
    }

    /// Resolve an activity line's time of day against the anchor date.
    ///
    /// A time whose hour is earlier than the anchor's hour is taken to be
    /// past midnight and moved to the next day. Only one day of drift is
    /// corrected. The anchor itself does not move.
    ///
    /// Returns `Ok(None)` when no anchor has been established yet.
    pub fn resolve(&self, time: &str) -> Result<Option<DateTime<FixedOffset>>, EventError> {
        let time_of_day = parse_time(time)?;
        let Some(anchor) = self.current else {
            return Ok(None);
        };

        let candidate = self.on_anchor_date(anchor.date_naive(), time_of_day, time)?;
        if candidate.hour() < anchor.hour() {
            return Ok(Some(candidate + Duration::hours(24)));
        }
        Ok(Some(candidate))
    }

    /// Move the anchor's time of day to `time`, keeping its date.
    ///
    /// Used for prefixed lines that are neither markers nor activity.
    /// Returns `Ok(None)` when no anchor has been established yet.
    pub fn refresh(&mut self, time: &str) -> Result<Option<DateTime<FixedOffset>>, EventError> {
        let time_of_day = parse_time(time)?;
        let Some(anchor) = self.current else {
            return Ok(None);
        };

        let refreshed = self.on_anchor_date(anchor.date_naive(), time_of_day, time)?;
        self.current = Some(refreshed);
        Ok(Some(refreshed))
    }

    fn on_anchor_date(
        &self,
        date: NaiveDate,
        time_of_day: NaiveTime,
        input: &str,
    ) -> Result<DateTime<FixedOffset>, EventError> {
        self.localize(date.and_time(time_of_day), input)
    }

    fn localize(&self, naive: NaiveDateTime, input: &str) -> Result<DateTime<FixedOffset>, EventError> {
        self.timezone
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| EventError::parse(input, "not representable in the configured timezone"))
    }
}

fn parse_time(time: &str) -> Result<NaiveTime, EventError> {
    let parsed = NaiveTime::parse_from_str(time, TIME_FORMAT).map_err(|e| EventError::parse(time, e))?;
    reject_leap_second(parsed, time)?;
    Ok(parsed)
}

/// chrono reads `:60` as a leap second; the server never writes one.
fn reject_leap_second(time: NaiveTime, input: &str) -> Result<(), EventError> {
    if time.nanosecond() >= 1_000_000_000 {
        return Err(EventError::parse(input, "second out of range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(tz: FixedOffset, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_mark_sets_anchor() {
        let mut anchor = TimestampAnchor::new(utc());
        let resolved = anchor.mark("3/1/2024", "9:15:00").unwrap();
        assert_eq!(resolved, at(utc(), 2024, 3, 1, 9, 15, 0));
        assert_eq!(anchor.current(), Some(resolved));
    }

    #[test]
    fn test_mark_invalid_date_keeps_anchor() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("3/1/2024", "09:15:00").unwrap();

        let err = anchor.mark("13/45/2024", "10:00:00").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(anchor.current(), Some(at(utc(), 2024, 3, 1, 9, 15, 0)));
    }

    #[test]
    fn test_resolve_same_day() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("3/1/2024", "09:15:00").unwrap();

        let when = anchor.resolve("09:16:02").unwrap();
        assert_eq!(when, Some(at(utc(), 2024, 3, 1, 9, 16, 2)));
    }

    #[test]
    fn test_resolve_rolls_over_midnight() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("12/31/2023", "23:50:00").unwrap();

        let when = anchor.resolve("00:05:00").unwrap();
        assert_eq!(when, Some(at(utc(), 2024, 1, 1, 0, 5, 0)));
        // The anchor does not follow event lines
        assert_eq!(anchor.current(), Some(at(utc(), 2023, 12, 31, 23, 50, 0)));
    }

    #[test]
    fn test_resolve_same_hour_earlier_minute_no_rollover() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("3/1/2024", "09:30:00").unwrap();

        let when = anchor.resolve("09:10:00").unwrap();
        assert_eq!(when, Some(at(utc(), 2024, 3, 1, 9, 10, 0)));
    }

    #[test]
    fn test_resolve_without_anchor() {
        let anchor = TimestampAnchor::new(utc());
        assert_eq!(anchor.resolve("09:10:00").unwrap(), None);
    }

    #[test]
    fn test_resolve_invalid_time() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("3/1/2024", "09:30:00").unwrap();
        assert!(anchor.resolve("25:61:00").unwrap_err().is_parse());
    }

    #[test]
    fn test_refresh_moves_time_keeps_date() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("3/1/2024", "23:50:00").unwrap();

        let refreshed = anchor.refresh("01:00:00").unwrap();
        assert_eq!(refreshed, Some(at(utc(), 2024, 3, 1, 1, 0, 0)));
        assert_eq!(anchor.current(), refreshed);

        // Rollover now compares against the refreshed hour
        assert_eq!(anchor.resolve("00:30:00").unwrap(), Some(at(utc(), 2024, 3, 2, 0, 30, 0)));
        assert_eq!(anchor.resolve("02:00:00").unwrap(), Some(at(utc(), 2024, 3, 1, 2, 0, 0)));
    }

    #[test]
    fn test_second_sixty_rejected() {
        let mut anchor = TimestampAnchor::new(utc());
        anchor.mark("3/1/2024", "23:00:00").unwrap();

        assert!(anchor.resolve("23:59:60").unwrap_err().is_parse());
        assert!(anchor.refresh("23:59:60").unwrap_err().is_parse());
        assert!(anchor.mark("3/1/2024", "23:59:60").unwrap_err().is_parse());
        assert_eq!(anchor.current(), Some(at(utc(), 2024, 3, 1, 23, 0, 0)));
    }

    #[test]
    fn test_refresh_without_anchor() {
        let mut anchor = TimestampAnchor::new(utc());
        assert_eq!(anchor.refresh("01:00:00").unwrap(), None);
        assert_eq!(anchor.current(), None);
    }

    #[test]
    fn test_timezone_offset_applied() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let mut anchor = TimestampAnchor::new(cet);
        anchor.mark("3/1/2024", "09:15:00").unwrap();

        let when = anchor.resolve("09:16:02").unwrap().unwrap();
        assert_eq!(when.to_rfc3339(), "2024-03-01T09:16:02+01:00");
        assert_eq!(when.with_timezone(&utc()).to_rfc3339(), "2024-03-01T08:16:02+00:00");
    }
}
