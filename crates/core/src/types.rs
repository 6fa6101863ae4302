use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Patient identifiers are opaque strings; numeric ids are normalized to
/// their decimal form at the validation boundary.
pub type PatientId = String;

/// Heart rates are whole beats per minute.
pub type HeartRate = u32;

/// Canonical rendering of every stored timestamp (UTC, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A reading timestamp in canonical, lexically sortable form.
///
/// All timestamps are UTC and zero-padded, so the derived string ordering
/// is the temporal ordering. Construct through [`Timestamp::now`],
/// [`Timestamp::from_datetime`] or [`Timestamp::parse`] only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
    /// Current UTC wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse a caller-supplied timestamp and re-render it canonically.
    ///
    /// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DDTHH:MM:SS[.f]` and
    /// `YYYY-MM-DD HH:MM:SS[.f]`; offset-less forms are taken as UTC.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(Self::from_datetime(naive.and_utc()));
            }
        }
        Err(CoreError::InvalidArgument(format!(
            "'{raw}' is not a recognised timestamp (expected e.g. 2024-01-01T12:00:00.000000)"
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}
