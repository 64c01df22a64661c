//! Nanosecond-precision timestamp type
//!
//! `SearchDoc::created_at` is always carried as nanoseconds since the Unix
//! epoch, and the same integer doubles as the posting-list score. Domain
//! records arrive with two encodings (epoch milliseconds and RFC3339
//! strings); both are converted here.
//!
//! ```
//! use agora_core::Timestamp;
//!
//! let ts = Timestamp::from_millis(1_500);
//! assert_eq!(ts.as_nanos(), 1_500_000_000);
//!
//! let parsed = Timestamp::parse_rfc3339("1970-01-01T00:00:01Z").unwrap();
//! assert_eq!(parsed.as_nanos(), 1_000_000_000);
//! ```

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since Unix epoch.
///
/// Signed so that dates before 1970 still order correctly as scores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Current wall-clock time.
    ///
    /// Returns epoch if the system clock is before 1970.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
    }

    /// Create from raw nanoseconds since epoch
    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        Timestamp(nanos)
    }

    /// Create from epoch milliseconds (saturating)
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Timestamp(millis.saturating_mul(1_000_000))
    }

    /// Parse an RFC3339 string such as `2024-05-01T10:00:00.123456789+02:00`.
    ///
    /// Returns `None` when the string is not RFC3339 or falls outside the
    /// representable nanosecond range (roughly years 1677 to 2262).
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).ok()?;
        dt.timestamp_nanos_opt().map(Timestamp)
    }

    /// Nanoseconds since epoch; this is the posting-list score.
    #[inline]
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Milliseconds since epoch (truncates toward zero)
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0 / 1_000_000
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl From<i64> for Timestamp {
    /// Create from raw nanoseconds
    fn from(nanos: i64) -> Self {
        Timestamp::from_nanos(nanos)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
