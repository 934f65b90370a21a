//! # Temporal Types — Chain Time
//!
//! The court reads two clocks from the chain: the current block timestamp
//! and the current block number. [`Timestamp`] is UTC with seconds
//! precision (block timestamps carry no sub-second component), and
//! [`BlockNumber`] is a plain block height.
//!
//! Term boundaries are computed by integer arithmetic on epoch seconds, so
//! `Timestamp` exposes checked second offsets rather than chrono durations.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if chrono cannot
    /// represent the instant.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(ValidationError::InvalidTimestamp(secs))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This instant moved forward by `secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the result leaves
    /// chrono's representable range.
    pub fn checked_add_secs(&self, secs: u64) -> Result<Self, ValidationError> {
        let secs = i64::try_from(secs).map_err(|_| ValidationError::InvalidTimestamp(i64::MAX))?;
        let target = self
            .epoch_secs()
            .checked_add(secs)
            .ok_or(ValidationError::InvalidTimestamp(i64::MAX))?;
        Self::from_epoch_secs(target)
    }

    /// This instant moved backward by `secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the result leaves
    /// chrono's representable range.
    pub fn checked_sub_secs(&self, secs: u64) -> Result<Self, ValidationError> {
        let secs = i64::try_from(secs).map_err(|_| ValidationError::InvalidTimestamp(i64::MIN))?;
        let target = self
            .epoch_secs()
            .checked_sub(secs)
            .ok_or(ValidationError::InvalidTimestamp(i64::MIN))?;
        Self::from_epoch_secs(target)
    }

    /// Whole seconds elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    pub fn secs_since(&self, earlier: &Timestamp) -> u64 {
        u64::try_from(self.epoch_secs().saturating_sub(earlier.epoch_secs())).unwrap_or(0)
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Height of a block on the underlying chain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockNumber(pub u64);

impl BlockNumber {
    /// The raw block height.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The following block, saturating at `u64::MAX`.
    pub fn successor(self) -> BlockNumber {
        BlockNumber(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn from_utc_truncates_subseconds() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        let ts = Timestamp::from_utc(dt);
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn epoch_round_trip() {
        let ts = Timestamp::from_epoch_secs(1_700_000_000).unwrap();
        assert_eq!(ts.epoch_secs(), 1_700_000_000);
    }

    #[test]
    fn second_offsets() {
        let ts = Timestamp::from_epoch_secs(1_000).unwrap();
        assert_eq!(ts.checked_add_secs(86_400).unwrap().epoch_secs(), 87_400);
        assert_eq!(ts.checked_sub_secs(1_000).unwrap().epoch_secs(), 0);
        assert!(ts.checked_add_secs(u64::MAX).is_err());
    }

    #[test]
    fn secs_since_saturates() {
        let a = Timestamp::from_epoch_secs(100).unwrap();
        let b = Timestamp::from_epoch_secs(160).unwrap();
        assert_eq!(b.secs_since(&a), 60);
        assert_eq!(a.secs_since(&b), 0);
    }

    #[test]
    fn block_successor() {
        assert_eq!(BlockNumber(7).successor(), BlockNumber(8));
        assert_eq!(BlockNumber(u64::MAX).successor(), BlockNumber(u64::MAX));
        assert_eq!(BlockNumber(7).to_string(), "#7");
    }
}
