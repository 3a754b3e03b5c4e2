//! Target instant parsing

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("target instant is empty")]
    Empty,

    #[error("unrecognized target instant: {0}")]
    Unparseable(String),

    #[error("target instant does not exist in the local time zone: {0}")]
    NonexistentLocalTime(String),
}

/// Parse a target instant, reading zone-less forms as local time
pub fn parse_target(raw: &str) -> Result<DateTime<Utc>, TargetError> {
    parse_target_in(raw, &Local)
}

/// Parse a target instant, reading zone-less forms in `tz`
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` and a bare `YYYY-MM-DD`
/// (midnight). Ambiguous local times resolve to the earlier instant.
pub fn parse_target_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<DateTime<Utc>, TargetError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TargetError::Empty);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TargetError::Unparseable(raw.to_string()))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| TargetError::NonexistentLocalTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_target("2030-01-02T03:04:05+02:00"),
            Ok(utc("2030-01-02T01:04:05Z"))
        );
    }

    #[test]
    fn test_zone_less_forms_use_given_zone() {
        let tz = FixedOffset::east_opt(3_600).unwrap();
        let expected = utc("2030-01-02T02:04:05Z");

        assert_eq!(parse_target_in("2030-01-02 03:04:05", &tz), Ok(expected));
        assert_eq!(parse_target_in("2030-01-02T03:04:05", &tz), Ok(expected));
        assert_eq!(
            parse_target_in("2030-01-02 03:04", &tz),
            Ok(utc("2030-01-02T02:04:00Z"))
        );
        assert_eq!(
            parse_target_in("  2030-01-02 ", &tz),
            Ok(utc("2030-01-01T23:00:00Z"))
        );
    }

    #[test]
    fn test_invalid_targets() {
        assert_eq!(parse_target("   "), Err(TargetError::Empty));
        assert_eq!(
            parse_target("next tuesday"),
            Err(TargetError::Unparseable("next tuesday".to_string()))
        );
        assert!(parse_target("2030-13-40 25:00:00").is_err());
    }
}
