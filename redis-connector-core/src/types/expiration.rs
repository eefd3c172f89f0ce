//! Expiration and write-condition options

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Unit used when converting TTL and clock readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Nanoseconds
    Nanoseconds,
    /// Microseconds
    Microseconds,
    /// Milliseconds
    Milliseconds,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

impl TimeUnit {
    const fn nanos(self) -> i128 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => 1_000,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60_000_000_000,
            Self::Hours => 3_600_000_000_000,
            Self::Days => 86_400_000_000_000,
        }
    }

    /// Convert `value` expressed in `from` into this unit, truncating
    /// towards zero and saturating at the `i64` range
    #[must_use]
    pub fn convert(self, value: i64, from: Self) -> i64 {
        let nanos = i128::from(value) * from.nanos();
        let converted = nanos / self.nanos();
        converted.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Convert `value` in this unit to milliseconds
    #[must_use]
    pub fn to_millis(self, value: i64) -> i64 {
        Self::Milliseconds.convert(value, self)
    }

    /// Convert `value` in this unit to seconds
    #[must_use]
    pub fn to_seconds(self, value: i64) -> i64 {
        Self::Seconds.convert(value, self)
    }
}

/// How long a written value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// No expiry; for `GETEX` this removes an existing TTL
    Persistent,
    /// Keep the TTL the key already has
    KeepTtl,
    /// Relative expiry in seconds (`EX`)
    Seconds(u64),
    /// Relative expiry in milliseconds (`PX`)
    Milliseconds(u64),
    /// Absolute expiry as a unix timestamp in seconds (`EXAT`)
    UnixTimestampSeconds(u64),
    /// Absolute expiry as a unix timestamp in milliseconds (`PXAT`)
    UnixTimestampMilliseconds(u64),
}

impl Expiration {
    /// Expiration from a duration
    ///
    /// A zero duration means persistent. Durations with sub-second precision
    /// keep millisecond resolution, everything else is sent in seconds.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        if duration.is_zero() {
            Self::Persistent
        } else if duration.subsec_nanos() != 0 {
            Self::Milliseconds(duration.as_millis().max(1) as u64)
        } else {
            Self::Seconds(duration.as_secs())
        }
    }

    /// Expiration from a timeout in the given unit
    ///
    /// Sub-second units collapse to milliseconds, coarser units to seconds.
    #[must_use]
    pub fn from_timeout(value: u64, unit: TimeUnit) -> Self {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        match unit {
            TimeUnit::Nanoseconds | TimeUnit::Microseconds | TimeUnit::Milliseconds => {
                Self::Milliseconds(unit.to_millis(value).max(0) as u64)
            }
            _ => Self::Seconds(unit.to_seconds(value).max(0) as u64),
        }
    }

    /// Absolute expiration at the given point in time
    #[must_use]
    pub fn unix_timestamp(at: SystemTime) -> Self {
        let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
        if since_epoch.subsec_millis() == 0 {
            Self::UnixTimestampSeconds(since_epoch.as_secs())
        } else {
            Self::UnixTimestampMilliseconds(since_epoch.as_millis() as u64)
        }
    }

    /// Whether the value never expires
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent)
    }

    /// Whether the existing TTL is kept
    #[must_use]
    pub const fn is_keep_ttl(&self) -> bool {
        matches!(self, Self::KeepTtl)
    }

    /// Whether the expiration is a unix timestamp rather than a timeout
    #[must_use]
    pub const fn is_unix_timestamp(&self) -> bool {
        matches!(
            self,
            Self::UnixTimestampSeconds(_) | Self::UnixTimestampMilliseconds(_)
        )
    }

    /// The relative timeout, if this is one
    #[must_use]
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Seconds(s) => Some(Duration::from_secs(*s)),
            Self::Milliseconds(ms) => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

impl From<Duration> for Expiration {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

/// Condition attached to `SET`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetCondition {
    /// Always write
    #[default]
    Upsert,
    /// Only write when the key does not exist (`NX`)
    IfAbsent,
    /// Only write when the key exists (`XX`)
    IfPresent,
}

/// Condition attached to `EXPIRE` and friends (Redis 7.0+)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpireCondition {
    /// Always apply
    #[default]
    Always,
    /// Only when the key has no expiry
    Nx,
    /// Only when the key already has an expiry
    Xx,
    /// Only when the new expiry is greater than the current one
    Gt,
    /// Only when the new expiry is less than the current one
    Lt,
}
