//! # Temporal Types — UTC Millisecond Timestamps
//!
//! Defines `Timestamp`, a UTC-only instant truncated to millisecond
//! precision. Credentials carry their issuance instant as epoch
//! milliseconds on the wire, so the in-memory type drops anything finer
//! to keep encode/decode lossless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClubpassError;

/// A UTC-only timestamp, truncated to milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// From a `DateTime<Utc>`, truncating sub-millisecond components.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        let millis = dt.timestamp_millis();
        Self(DateTime::from_timestamp_millis(millis).unwrap_or(dt))
    }

    /// From Unix epoch milliseconds.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, ClubpassError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| ClubpassError::Validation(format!("invalid epoch millis: {millis}")))
    }

    /// Unix epoch milliseconds.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Signed milliseconds from `earlier` to `self`.
    pub fn millis_since(&self, earlier: &Timestamp) -> i64 {
        self.epoch_millis().saturating_sub(earlier.epoch_millis())
    }

    /// Render as ISO8601 with millisecond precision and Z suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_from_utc_truncates_to_millis() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0).unwrap();
        let dt = dt.with_nanosecond(123_456_789).unwrap();
        let ts = Timestamp::from_utc(dt);
        assert_eq!(ts.as_datetime().nanosecond(), 123_000_000);
        assert_eq!(ts.to_iso8601(), "2026-03-02T09:15:00.123Z");
    }

    #[test]
    fn test_epoch_millis_roundtrip() {
        let ts = Timestamp::from_epoch_millis(1_772_442_900_500).unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-02T09:15:00.500Z");
        let back = Timestamp::from_epoch_millis(ts.epoch_millis()).unwrap();
        assert_eq!(ts, back);
    }

    #[test]
    fn test_out_of_range_epoch_millis_rejected() {
        assert!(matches!(
            Timestamp::from_epoch_millis(i64::MAX),
            Err(ClubpassError::Validation(_))
        ));
    }

    #[test]
    fn test_millis_since() {
        let a = Timestamp::from_epoch_millis(1_000).unwrap();
        let b = Timestamp::from_epoch_millis(21_000).unwrap();
        assert_eq!(b.millis_since(&a), 20_000);
        assert_eq!(a.millis_since(&b), -20_000);
    }
}
