//! Timezone — fixed UTC offsets accepted in configuration.

use chrono::FixedOffset;

use super::model::ConfigError;

/// Parse `UTC`, `Z`, or a `±HH:MM` / `±HHMM` offset.
pub fn parse_timezone(raw: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = raw.trim();
    let invalid = || ConfigError::InvalidTimezone(raw.to_string());

    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 => rest.split_at(2),
        None => return Err(invalid()),
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_aliases() {
        for raw in ["UTC", "utc", "Z", " z "] {
            assert_eq!(parse_timezone(raw).unwrap().local_minus_utc(), 0, "{}", raw);
        }
    }

    #[test]
    fn test_signed_offsets() {
        assert_eq!(parse_timezone("+02:00").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_timezone("-05:30").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_timezone("+0100").unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "CET", "02:00", "+2", "+24:00", "+01:60", "+aa:bb", "+01:00:00"] {
            assert!(
                matches!(parse_timezone(raw), Err(ConfigError::InvalidTimezone(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }
}
