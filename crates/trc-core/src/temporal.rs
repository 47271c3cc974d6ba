//! # Temporal Types: Unix-Second Timestamps
//!
//! Defines `Timestamp`, a UTC timestamp at seconds precision. TRCs and
//! certificates carry their validity windows as integer Unix seconds, so
//! the serde form is an integer and sub-second components never exist.
//!
//! Durations (grace periods, validity periods) are whole seconds and are
//! added with saturating arithmetic so a hostile `grace_period` cannot wrap
//! a window around.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TrustError;

/// Seconds in one day.
pub const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// A UTC timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TrustError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| TrustError::Schema(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Add whole seconds, saturating at the largest representable instant.
    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        let delta = i64::try_from(secs).unwrap_or(i64::MAX);
        let target = self.epoch_secs().saturating_add(delta);
        Self::from_epoch_secs(target).unwrap_or(Self(DateTime::<Utc>::MAX_UTC))
    }

    /// Add whole days (validity periods are configured in days).
    pub fn saturating_add_days(&self, days: u64) -> Self {
        self.saturating_add_secs(days.saturating_mul(SECS_PER_DAY))
    }

    /// Render as ISO8601 with Z suffix, for diagnostics only.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.epoch_secs())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Self::from_epoch_secs(secs).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2018, 3, 1, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(ts.to_iso8601(), "2018-03-01T12:30:45Z");
    }

    #[test]
    fn test_epoch_roundtrip() {
        let ts = Timestamp::from_epoch_secs(1_520_000_000).unwrap();
        assert_eq!(ts.epoch_secs(), 1_520_000_000);
    }

    #[test]
    fn test_add_days() {
        let ts = Timestamp::from_epoch_secs(1_000).unwrap();
        assert_eq!(ts.saturating_add_days(365).epoch_secs(), 1_000 + 365 * 86_400);
    }

    #[test]
    fn test_add_saturates() {
        let ts = Timestamp::from_epoch_secs(1_000).unwrap();
        let far = ts.saturating_add_secs(u64::MAX);
        assert!(far > ts);
    }

    #[test]
    fn test_serializes_as_integer() {
        let ts = Timestamp::from_epoch_secs(1_520_000_000).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1520000000");
        let back: Timestamp = serde_json::from_str("1520000000").unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::from_epoch_secs(10).unwrap();
        let later = Timestamp::from_epoch_secs(11).unwrap();
        assert!(earlier < later);
    }
}
