use crate::value::ValueError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{self, Display};

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_UNIX_SECONDS: i64 = -62_135_596_800;

///
/// Timestamp
///
/// UTC instant. The zero value is `0001-01-01T00:00:00Z`, which is what an
/// untouched `created_at` / `updated_at` encodes to.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    #[must_use]
    pub fn zero() -> Self {
        Self(DateTime::from_timestamp(ZERO_UNIX_SECONDS, 0).unwrap_or_default())
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    #[must_use]
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, ValueError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ValueError::InvalidTimestamp(format!("{s}: {e}")))
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.timestamp() == ZERO_UNIX_SECONDS && self.0.timestamp_subsec_nanos() == 0
    }

    #[must_use]
    pub fn unix_seconds(self) -> i64 {
        self.0.timestamp()
    }

    /// Canonical text form; fractional seconds only when present.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::zero()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_renders_as_year_one() {
        let zero = Timestamp::default();

        assert!(zero.is_zero());
        assert_eq!(zero.to_rfc3339(), "0001-01-01T00:00:00Z");
    }

    #[test]
    fn rfc3339_parse_normalizes_offset() {
        let ts = Timestamp::parse_rfc3339("2024-03-01T12:30:00+02:00").unwrap();

        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:30:00Z");
        assert!(!ts.is_zero());
    }

    #[test]
    fn rfc3339_parse_rejects_garbage() {
        let err = Timestamp::parse_rfc3339("yesterday").unwrap_err();

        assert!(matches!(err, ValueError::InvalidTimestamp(_)));
    }

    #[test]
    fn unix_seconds_round_trip() {
        let ts = Timestamp::from_unix_seconds(1_700_000_000).unwrap();

        assert_eq!(ts.unix_seconds(), 1_700_000_000);
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20Z");
    }
}
