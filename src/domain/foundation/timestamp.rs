//! Timestamp value object for immutable points in time.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wire format for every timestamp stored on a subscription record.
pub const RECORD_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Immutable point in time, always UTC with whole-second precision.
///
/// Serializes as `YYYY-MM-DDTHH:MM:SSZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self::from_unix_secs(Utc::now().timestamp()).unwrap_or(Self(Utc::now()))
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from provider epoch seconds.
    ///
    /// Returns `None` for values chrono cannot represent.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Converts an optional epoch field, treating zero as absent.
    pub fn from_optional_unix(secs: Option<i64>) -> Option<Self> {
        secs.filter(|s| *s > 0).and_then(Self::from_unix_secs)
    }

    /// Parses the record format back into a timestamp.
    pub fn parse_record(value: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(value, RECORD_FORMAT)
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }

    /// Formats using the fixed record format.
    pub fn to_record_string(&self) -> String {
        self.0.format(RECORD_FORMAT).to_string()
    }

    /// Calendar date only, used for renewal dates in emails.
    pub fn to_date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_record_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_record_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_record(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}
