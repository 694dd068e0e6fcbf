//! Timestamp serde helpers
//!
//! The vendor returns RFC 3339 strings, but a few older endpoints emit Unix
//! seconds. Both deserialize into `Option<DateTime<Utc>>`; serialization
//! always produces RFC 3339 so state stays uniform.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize `Option<DateTime<Utc>>` as an RFC 3339 string (or null).
pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => serializer.serialize_some(&to_rfc3339(dt)),
        None => serializer.serialize_none(),
    }
}

/// Deserialize from an RFC 3339 string or a Unix timestamp in seconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Seconds(i64),
    }

    match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(RawTimestamp::Text(s)) => parse_rfc3339(&s)
            .map(Some)
            .ok_or_else(|| Error::custom(format!("Invalid RFC 3339 timestamp: {s}"))),
        Some(RawTimestamp::Seconds(ts)) => DateTime::from_timestamp(ts, 0)
            .map(Some)
            .ok_or_else(|| Error::custom("Invalid Unix timestamp")),
        None => Ok(None),
    }
}

/// Canonical RFC 3339 rendering used in state (UTC, `Z` suffix, no sub-second noise).
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse any RFC 3339 string into UTC.
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(default, with = "crate::utils::datetime")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn offset_normalized_to_utc() {
        let dt = parse_rfc3339("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(to_rfc3339(&dt), "2024-03-01T10:00:00Z");
    }

    #[test]
    fn deserialize_string_and_seconds() {
        let a: Stamped = serde_json::from_str(r#"{"at":"2024-03-01T10:00:00Z"}"#).unwrap();
        let b: Stamped = serde_json::from_str(r#"{"at":1709287200}"#).unwrap();
        assert_eq!(a.at, b.at);
    }

    #[test]
    fn deserialize_null_and_missing() {
        let a: Stamped = serde_json::from_str(r#"{"at":null}"#).unwrap();
        let b: Stamped = serde_json::from_str("{}").unwrap();
        assert!(a.at.is_none());
        assert!(b.at.is_none());
    }

    #[test]
    fn invalid_string_rejected() {
        assert!(serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#).is_err());
    }

    #[test]
    fn serialize_round_trip() {
        let s = Stamped {
            at: parse_rfc3339("2024-03-01T10:00:00.5Z"),
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"at":"2024-03-01T10:00:00.500Z"}"#);
    }
}
