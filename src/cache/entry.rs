//! Cache Entry Module
//!
//! Stored entries, their metadata records, and the caller-facing metadata view.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Cache Entry ==
/// A stored payload with its timestamps. Never handed to callers.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Encoded bytes
    pub payload: Vec<u8>,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
    /// When the entry stops being visible
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl_seconds`.
    pub fn new(payload: Vec<u8>, now: DateTime<Utc>, ttl_seconds: u64) -> Self {
        Self {
            payload,
            stored_at: now,
            expires_at: expiry_after(now, ttl_seconds),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` is strictly past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Adds a TTL to a timestamp, saturating at the far future.
pub fn expiry_after(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// == Metadata Record ==
/// The body of a metadata entry, as written to either backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MetadataRecord {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Returns `None` for unreadable records.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

impl From<&CacheEntry> for MetadataRecord {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            stored_at: entry.stored_at,
            expires_at: entry.expires_at,
        }
    }
}

// == Cache Metadata ==
/// Read-only view of an unexpired entry, ready for a JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheMetadata {
    /// Always `"hit"`
    pub status: String,
    /// ISO 8601 write time
    pub stored_at: String,
    /// ISO 8601 expiry time
    pub expires_at: String,
}

impl From<MetadataRecord> for CacheMetadata {
    fn from(record: MetadataRecord) -> Self {
        Self {
            status: "hit".to_string(),
            stored_at: record.stored_at.to_rfc3339(),
            expires_at: record.expires_at.to_rfc3339(),
        }
    }
}
