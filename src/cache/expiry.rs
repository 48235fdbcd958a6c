//! Expiry Module
//!
//! TTL handling for cache writes and its translation into each backend's
//! native expiry representation.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Expiry ==
/// When a written value stops being a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Persist indefinitely, clearing any previous expiry
    #[default]
    Never,
    /// Expire this many seconds after the write
    After(u64),
    /// Expire at an absolute point in time
    At(DateTime<Utc>),
}

impl Expiry {
    // == Parse TTL ==
    /// Parses an untyped TTL as received from a caller.
    ///
    /// Accepts an absent value or JSON null, a non-negative integer count of
    /// seconds, or an RFC 3339 timestamp string. Anything else is rejected
    /// with `InvalidArgument`.
    pub fn from_ttl(ttl: Option<&Value>) -> Result<Self> {
        match ttl {
            None | Some(Value::Null) => Ok(Expiry::Never),
            Some(Value::Number(n)) => n.as_u64().map(Expiry::After).ok_or_else(|| {
                CacheError::InvalidArgument(format!(
                    "TTL must be a non-negative integer number of seconds, got {}",
                    n
                ))
            }),
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Expiry::At(dt.with_timezone(&Utc)))
                .map_err(|_| {
                    CacheError::InvalidArgument(format!(
                        "TTL must be a timestamp or an integer, got \"{}\"",
                        s
                    ))
                }),
            Some(other) => Err(CacheError::InvalidArgument(format!(
                "TTL must be a timestamp or an integer, got {}",
                other
            ))),
        }
    }

    // == Absolute Deadline ==
    /// Point in time at which the value expires, relative to `now`.
    pub fn deadline(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Never => None,
            Expiry::After(secs) => {
                let secs = i64::try_from(*secs).unwrap_or(i64::MAX);
                Some(
                    Duration::try_seconds(secs)
                        .and_then(|d| now.checked_add_signed(d))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                )
            }
            Expiry::At(at) => Some(*at),
        }
    }

    /// Deadline as Unix epoch seconds (Redis `EXPIREAT`).
    pub fn unix_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline(now).map(|dt| dt.timestamp())
    }

    /// Deadline as seconds from `now` (ORM persistence TTL).
    ///
    /// Past timestamps clamp to zero, meaning already expired.
    pub fn seconds_from(&self, now: DateTime<Utc>) -> Option<u64> {
        match self {
            Expiry::Never => None,
            Expiry::After(secs) => Some(*secs),
            Expiry::At(at) => Some(u64::try_from((*at - now).num_seconds()).unwrap_or(0)),
        }
    }
}

impl From<u64> for Expiry {
    fn from(secs: u64) -> Self {
        Expiry::After(secs)
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Expiry::At(at)
    }
}

impl From<Option<u64>> for Expiry {
    fn from(secs: Option<u64>) -> Self {
        secs.map_or(Expiry::Never, Expiry::After)
    }
}

// == Utility Functions ==
/// Returns true once `expires_at` has been reached.
///
/// An entry is expired when the current time is greater than or equal to its
/// deadline.
pub fn is_past(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(deadline) => now >= deadline,
        None => false,
    }
}
