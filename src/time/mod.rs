//! Timestamp conversion and resolution
//!
//! The service addresses measurements by epoch seconds. Users may give an
//! epoch, an ISO-8601 instant (read as UTC), or nothing at all, which means
//! "the latest measurement" and travels to the service as the sentinel `0`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::types::{TimestampEntry, LATEST_SENTINEL};

/// Output layout of [`epoch_to_iso`]: UTC, no zone suffix.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Local-notation layouts accepted by [`iso_to_epoch`], tried in order.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Unparsable ISO-8601 timestamp: '{0}'")]
    InvalidIso(String),

    #[error("Timestamp is neither ISO-8601 nor integer epoch seconds: '{0}'")]
    InvalidEpoch(String),

    #[error("Epoch {0} is outside the representable calendar range")]
    OutOfRange(i64),
}

/// Render epoch seconds as `YYYY-MM-DDTHH:MM:SS` (UTC).
pub fn epoch_to_iso(epoch: i64) -> Result<String, TimeParseError> {
    let dt = DateTime::<Utc>::from_timestamp(epoch, 0).ok_or(TimeParseError::OutOfRange(epoch))?;
    if !(1..=9999).contains(&dt.year()) {
        return Err(TimeParseError::OutOfRange(epoch));
    }
    Ok(dt.format(ISO_FORMAT).to_string())
}

/// Parse an ISO-8601 instant into epoch seconds.
///
/// The wall-clock reading is always taken as UTC: a bare date means
/// midnight, a bare hour means minute zero, and an explicit offset or `Z` is
/// accepted but discarded.
pub fn iso_to_epoch(iso: &str) -> Result<i64, TimeParseError> {
    let text = iso.trim();

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().timestamp());
        }
    }

    if let Some(naive) = parse_hour_only(text) {
        return Ok(naive.and_utc().timestamp());
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp());
        }
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_local().and_utc().timestamp())
        .map_err(|_| TimeParseError::InvalidIso(iso.to_string()))
}

/// `YYYY-MM-DDTHH` (or with a space separator), which chrono will not parse
/// without a minute field.
fn parse_hour_only(text: &str) -> Option<NaiveDateTime> {
    let (date, hour) = text.split_once(['T', ' '])?;
    if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}T{hour}:00"), "%Y-%m-%dT%H:%M").ok()
}

/// A request for one measurement in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSpec {
    /// Most recent measurement (sentinel `0` on the wire)
    Latest,
    /// A concrete epoch in seconds
    Epoch(i64),
}

impl TimestampSpec {
    pub fn from_epoch(epoch: i64) -> Self {
        if epoch == LATEST_SENTINEL {
            Self::Latest
        } else {
            Self::Epoch(epoch)
        }
    }

    /// Epoch value sent to the service.
    pub fn wire_epoch(self) -> i64 {
        match self {
            Self::Latest => LATEST_SENTINEL,
            Self::Epoch(e) => e,
        }
    }

    /// Resolve against a catalog listing (oldest first).
    ///
    /// `Latest` becomes the last listed entry; a concrete epoch is returned
    /// as-is whether or not it is listed.
    pub fn resolve_against(self, available: &[TimestampEntry]) -> ResolvedTimestamp {
        match self {
            Self::Epoch(e) => ResolvedTimestamp::Concrete(e),
            Self::Latest => available
                .last()
                .map_or(ResolvedTimestamp::Unresolved, |entry| {
                    ResolvedTimestamp::Concrete(entry.epoch)
                }),
        }
    }
}

impl std::fmt::Display for TimestampSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Epoch(e) => write!(f, "{e}"),
        }
    }
}

/// The concrete epoch a fetched record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTimestamp {
    Concrete(i64),
    /// "Latest" was requested and no listing entry could name it
    Unresolved,
}

impl ResolvedTimestamp {
    pub fn epoch(self) -> Option<i64> {
        match self {
            Self::Concrete(e) => Some(e),
            Self::Unresolved => None,
        }
    }

    /// Label used for file names and display: the epoch, or `latest`.
    pub fn label(self) -> String {
        match self {
            Self::Concrete(e) => e.to_string(),
            Self::Unresolved => "latest".to_string(),
        }
    }
}

/// Turn a user-supplied specifier into a [`TimestampSpec`].
///
/// - `None` or blank: latest
/// - contains `-` or `T`: ISO-8601, converted with [`iso_to_epoch`]
/// - otherwise: integer epoch seconds
///
/// Callers reject "both an ISO instant and an epoch" before getting here.
pub fn resolve_timestamp_specifier(specifier: Option<&str>) -> Result<TimestampSpec, TimeParseError> {
    let Some(text) = specifier.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(TimestampSpec::Latest);
    };

    let epoch = if text.contains('-') || text.contains('T') {
        iso_to_epoch(text)?
    } else {
        text.parse::<i64>()
            .map_err(|_| TimeParseError::InvalidEpoch(text.to_string()))?
    };
    Ok(TimestampSpec::from_epoch(epoch))
}
