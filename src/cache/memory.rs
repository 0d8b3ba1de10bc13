//! Memory Backend Module
//!
//! Process-local cache store: one map from prefixed key to entry, with lazy
//! expiry checked on every read and never swept in the background.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::keys::{self, KeyPattern};
use crate::cache::ttl::{TtlInput, TtlPolicy};
use crate::cache::{
    CacheEntry, CacheMetadata, CacheStats, CacheStore, CacheValue, Clock, Codec, MetadataRecord,
    SystemClock,
};
use crate::config::CacheConfig;
use crate::error::Result;

// == Memory State ==
/// Entries and counters, always mutated together under one lock.
#[derive(Debug, Default)]
struct MemoryState {
    /// Value and metadata entries keyed by their prefixed key
    entries: HashMap<String, CacheEntry>,
    /// Hit, miss and size counters
    stats: CacheStats,
}

impl MemoryState {
    /// Removes the value and metadata entries of a logical key.
    ///
    /// Returns whether a value entry existed; `size` follows that answer.
    fn remove(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(&keys::value_key(key)).is_some();
        self.entries.remove(&keys::metadata_key(key));
        if existed {
            self.stats.record_removals(1);
        }
        existed
    }
}

enum Lookup {
    Missing,
    Expired,
    Live(Vec<u8>),
}

fn live_payload(state: &MemoryState, prefixed_key: &str, now: DateTime<Utc>) -> Lookup {
    match state.entries.get(prefixed_key) {
        None => Lookup::Missing,
        Some(entry) if entry.is_expired(now) => Lookup::Expired,
        Some(entry) => Lookup::Live(entry.payload.clone()),
    }
}

// == Memory Cache ==
/// In-process cache store.
#[derive(Debug)]
pub struct MemoryCache {
    state: Mutex<MemoryState>,
    codec: Codec,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty store using the wall clock.
    pub fn new(codec: Codec, ttl: TtlPolicy) -> Self {
        Self::with_clock(codec, ttl, Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    pub fn with_clock(codec: Codec, ttl: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            codec,
            ttl,
            clock,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            Codec::new(config.compression),
            TtlPolicy::from_config(config),
        )
    }

    /// Number of value entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state
            .entries
            .keys()
            .filter(|key| keys::logical_key(key).is_some())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let payload = match live_payload(&state, &keys::value_key(key), now) {
            Lookup::Missing => None,
            Lookup::Expired => {
                // Expired entries are dropped as part of the same locked read
                state.remove(key);
                debug!("Cache entry expired: {}", key);
                None
            }
            Lookup::Live(payload) => Some(payload),
        };

        let Some(payload) = payload else {
            state.stats.record_miss();
            debug!("Cache miss: {}", key);
            return Ok(None);
        };

        state.stats.record_hit();
        drop(state);
        debug!("Cache hit: {}", key);

        let value = self.codec.decode(&payload);
        if value.is_none() {
            warn!("Cached value for {} could not be decoded", key);
        }
        Ok(value)
    }

    // == Set ==
    async fn set(&self, key: &str, value: &CacheValue, ttl: TtlInput) -> Result<bool> {
        let ttl = self.ttl.normalize(ttl);
        let payload = self.codec.encode(value)?;
        let now = self.clock.now();

        let entry = CacheEntry::new(payload, now, ttl);
        let metadata = CacheEntry {
            payload: MetadataRecord::from(&entry).encode()?,
            stored_at: entry.stored_at,
            expires_at: entry.expires_at,
        };

        let mut state = self.state.lock().await;
        if state.entries.insert(keys::value_key(key), entry).is_none() {
            state.stats.record_insert();
        }
        state.entries.insert(keys::metadata_key(key), metadata);
        drop(state);

        debug!("Cache set: {} (ttl={}s)", key, ttl);
        Ok(true)
    }

    // == Delete ==
    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state.remove(key))
    }

    // == Delete Pattern ==
    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let matcher = KeyPattern::new(pattern)?;
        let mut state = self.state.lock().await;

        let matching: Vec<String> = state
            .entries
            .keys()
            .filter_map(|key| keys::logical_key(key))
            .filter(|key| matcher.matches(key))
            .map(str::to_string)
            .collect();

        let count = matching
            .iter()
            .filter(|key| state.remove(key))
            .count();
        drop(state);

        info!("Deleted {} cache entries matching '{}'", count, pattern);
        Ok(count)
    }

    // == Get Metadata ==
    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let payload = match live_payload(&state, &keys::metadata_key(key), now) {
            Lookup::Missing => return Ok(None),
            Lookup::Expired => {
                state.remove(key);
                return Ok(None);
            }
            Lookup::Live(payload) => payload,
        };
        drop(state);

        match MetadataRecord::decode(&payload) {
            Some(record) => Ok(Some(CacheMetadata::from(record))),
            None => {
                warn!("Metadata for {} could not be parsed", key);
                Ok(None)
            }
        }
    }

    // == Clear ==
    async fn clear(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.stats.reset_size();
        drop(state);

        info!("Memory cache cleared");
        Ok(true)
    }

    // == Stats ==
    async fn get_stats(&self) -> Result<CacheStats> {
        Ok(self.state.lock().await.stats)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
