use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::JournalError;

const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Reads a timestamp as a session wall-clock time. A trailing UTC marker is
/// stripped and the rest is taken literally, so `2024-03-04T09:30:00Z` is
/// 09:30 on the chart rather than 09:30 UTC shifted to local time.
pub fn parse_wall_clock(raw: &str) -> Result<NaiveDateTime, JournalError> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .or_else(|| trimmed.strip_suffix("+00:00"))
        .unwrap_or(trimmed);

    for format in ACCEPTED_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(stripped, format) {
            return Ok(parsed);
        }
    }

    // Any other explicit offset: keep the written wall-clock value
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(stripped, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(JournalError::InvalidTimestamp(raw.to_string()))
}

pub fn format_wall_clock(value: &NaiveDateTime) -> String {
    value.format(STORAGE_FORMAT).to_string()
}

/// Serde adapter for `NaiveDateTime` fields stored as wall-clock strings.
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_wall_clock(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_wall_clock(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&super::super::format_wall_clock(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => super::super::parse_wall_clock(&raw)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Weekday};

    #[test]
    fn test_utc_marker_is_read_as_wall_clock() {
        let parsed = parse_wall_clock("2024-03-04T09:30:00.000Z").unwrap();
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.minute(), 30);
        assert_eq!(parsed.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_explicit_offset_keeps_written_time() {
        let parsed = parse_wall_clock("2024-03-04T22:15:00-05:00").unwrap();
        assert_eq!(parsed.hour(), 22);
        assert_eq!(parsed.day(), 4);
    }

    #[test]
    fn test_accepts_short_forms() {
        assert_eq!(parse_wall_clock("2024-03-04T09:30").unwrap().minute(), 30);
        assert_eq!(parse_wall_clock("2024-03-04 16:00:00").unwrap().hour(), 16);
        assert_eq!(parse_wall_clock("2024-03-04").unwrap().hour(), 0);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            parse_wall_clock("last tuesday"),
            Err(JournalError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_format_round_trip() {
        let parsed = parse_wall_clock("2024-03-04T09:30:15.250Z").unwrap();
        let formatted = format_wall_clock(&parsed);
        assert_eq!(formatted, "2024-03-04T09:30:15.250");
        assert_eq!(parse_wall_clock(&formatted).unwrap(), parsed);
    }
}
