//! TTL Policy Module
//!
//! Validates requested time-to-live values against configured bounds.

use crate::config::CacheConfig;

// == TTL Input ==
/// A TTL as supplied by a caller: absent, an integer, or text holding one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtlInput {
    Absent,
    Seconds(i64),
    Text(String),
}

impl From<Option<i64>> for TtlInput {
    fn from(ttl: Option<i64>) -> Self {
        ttl.map_or(TtlInput::Absent, TtlInput::Seconds)
    }
}

impl From<i64> for TtlInput {
    fn from(ttl: i64) -> Self {
        TtlInput::Seconds(ttl)
    }
}

impl From<u64> for TtlInput {
    fn from(ttl: u64) -> Self {
        i64::try_from(ttl).map_or(TtlInput::Seconds(i64::MAX), TtlInput::Seconds)
    }
}

impl From<&str> for TtlInput {
    fn from(ttl: &str) -> Self {
        TtlInput::Text(ttl.to_string())
    }
}

impl From<String> for TtlInput {
    fn from(ttl: String) -> Self {
        TtlInput::Text(ttl)
    }
}

impl From<Option<&str>> for TtlInput {
    fn from(ttl: Option<&str>) -> Self {
        ttl.map_or(TtlInput::Absent, TtlInput::from)
    }
}

// == TTL Policy ==
/// Clamps requested TTLs to `[min, max]`, substituting the default otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    default: u64,
    min: u64,
    max: u64,
}

/// Shortest TTL any backend will be asked to store; Redis rejects `SETEX 0`.
pub const MIN_TTL_SECONDS: u64 = 1;

impl TtlPolicy {
    /// Zero bounds and a zero default are raised to `MIN_TTL_SECONDS`.
    pub fn new(default: u64, min: u64, max: u64) -> Self {
        Self {
            default: default.max(MIN_TTL_SECONDS),
            min: min.max(MIN_TTL_SECONDS),
            max: max.max(MIN_TTL_SECONDS),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.default_ttl, config.ttl_min, config.ttl_max)
    }

    /// The TTL substituted for absent or invalid requests.
    pub fn default_ttl(&self) -> u64 {
        self.default
    }

    // == Normalize ==
    /// Returns a usable TTL in seconds. Never fails.
    ///
    /// Absent input, unparseable text and integers outside the inclusive
    /// bounds all yield the default; anything else is returned unchanged.
    pub fn normalize(&self, ttl: impl Into<TtlInput>) -> u64 {
        let seconds = match ttl.into() {
            TtlInput::Absent => return self.default,
            TtlInput::Seconds(seconds) => seconds,
            TtlInput::Text(text) => match text.trim().parse::<i64>() {
                Ok(seconds) => seconds,
                Err(_) => return self.default,
            },
        };

        match u64::try_from(seconds) {
            Ok(seconds) if (self.min..=self.max).contains(&seconds) => seconds,
            _ => self.default,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
