//! Timestamp parsing shared by request payloads.
//!
//! Clients send either RFC 3339 timestamps with an offset or naive ISO
//! timestamps without one. Naive values are interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an RFC 3339 or naive ISO 8601 timestamp into UTC.
pub fn parse_utc(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let trimmed = raw.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(value) => Ok(value.with_timezone(&Utc)),
        Err(rfc_err) => trimmed
            .parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|_| rfc_err),
    }
}

/// Serde adapter for required timestamp fields.
pub mod flexible_utc {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_utc(&raw).map_err(|err| D::Error::custom(format!("invalid timestamp {raw:?}: {err}")))
    }

    /// Serde adapter for optional timestamp fields. Pair with `#[serde(default)]`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let Some(raw) = Option::<String>::deserialize(deserializer)? else {
                return Ok(None);
            };
            crate::time::parse_utc(&raw)
                .map(Some)
                .map_err(|err| D::Error::custom(format!("invalid timestamp {raw:?}: {err}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let parsed = parse_utc("2024-03-01T10:00:00+02:00").expect("rfc3339");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn treats_naive_timestamps_as_utc() {
        let parsed = parse_utc("2024-03-01T10:00:00.250").expect("naive");
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utc("next tuesday").is_err());
    }
}
