//! Redis Backend Module
//!
//! Cache store over a shared Redis server. Expiry is delegated to Redis
//! (`SETEX`), counters live in one hash mutated with `HINCRBY`.
//!
//! Multi-command sequences are not transactional. `set` checks existence
//! before writing, so concurrent writers can miscount `size`, and a reader
//! can see a value without its metadata entry (or the reverse) between the
//! two writes. Both are accepted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::cache::entry::expiry_after;
use crate::cache::keys::{self, KeyPattern, METADATA_PREFIX, STATS_KEY, VALUE_PREFIX};
use crate::cache::ttl::{TtlInput, TtlPolicy};
use crate::cache::{
    CacheMetadata, CacheStats, CacheStore, CacheValue, Clock, Codec, MetadataRecord, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::Result;

// == Redis Cache ==
/// Shared-store cache backend.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    codec: Codec,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("codec", &self.codec)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    // == Connect ==
    /// Connects to `config.redis_url` and seeds the counter hash.
    ///
    /// Existing counters are left untouched so several processes can share them.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Self::with_connection(
            conn,
            Codec::new(config.compression),
            TtlPolicy::from_config(config),
        )
        .await
    }

    /// Wraps an existing connection.
    pub async fn with_connection(
        conn: ConnectionManager,
        codec: Codec,
        ttl: TtlPolicy,
    ) -> Result<Self> {
        let mut cache = Self {
            conn,
            codec,
            ttl,
            clock: Arc::new(SystemClock),
        };

        for field in ["hits", "misses", "size"] {
            cache
                .conn
                .hset_nx::<_, _, _, ()>(STATS_KEY, field, 0)
                .await?;
        }

        info!("Connected to Redis cache backend");
        Ok(cache)
    }

    async fn bump(&self, field: &str, delta: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hincr::<_, _, _, ()>(STATS_KEY, field, delta).await?;
        Ok(())
    }

    /// Lists every key matching a Redis glob.
    async fn keys_matching(&self, glob: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(glob).await?;
        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut conn = self.conn.clone();
        let payload: Option<Vec<u8>> = conn.get(keys::value_key(key)).await?;

        let Some(payload) = payload else {
            self.bump("misses", 1).await?;
            debug!("Cache miss: {}", key);
            return Ok(None);
        };

        self.bump("hits", 1).await?;
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
        let record = MetadataRecord {
            stored_at: now,
            expires_at: expiry_after(now, ttl),
        };

        let value_key = keys::value_key(key);
        let mut conn = self.conn.clone();

        // Checked before the write; racy under concurrent writers
        let existed: bool = conn.exists(&value_key).await?;

        conn.set_ex::<_, _, ()>(&value_key, payload, ttl).await?;
        conn.set_ex::<_, _, ()>(keys::metadata_key(key), record.encode()?, ttl)
            .await?;

        if !existed {
            self.bump("size", 1).await?;
        }

        debug!("Cache set: {} (ttl={}s)", key, ttl);
        Ok(true)
    }

    // == Delete ==
    async fn delete(&self, key: &str) -> Result<bool> {
        let value_key = keys::value_key(key);
        let mut conn = self.conn.clone();

        let existed: bool = conn.exists(&value_key).await?;
        if !existed {
            return Ok(false);
        }

        conn.del::<_, ()>(vec![value_key, keys::metadata_key(key)])
            .await?;
        self.bump("size", -1).await?;
        Ok(true)
    }

    // == Delete Pattern ==
    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern_glob = KeyPattern::new(pattern)?;
        let value_keys = self
            .keys_matching(&pattern_glob.to_redis_glob(VALUE_PREFIX))
            .await?;
        let metadata_keys = self
            .keys_matching(&pattern_glob.to_redis_glob(METADATA_PREFIX))
            .await?;

        self.delete_keys(&value_keys).await?;
        self.delete_keys(&metadata_keys).await?;

        let count = value_keys.len();
        if count > 0 {
            self.bump("size", -i64::try_from(count).unwrap_or(i64::MAX))
                .await?;
        }

        info!("Deleted {} cache entries matching '{}'", count, pattern);
        Ok(count)
    }

    // == Get Metadata ==
    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>> {
        let mut conn = self.conn.clone();
        let payload: Option<Vec<u8>> = conn.get(keys::metadata_key(key)).await?;

        let Some(payload) = payload else {
            return Ok(None);
        };

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
        let value_keys = self.keys_matching(&format!("{}*", VALUE_PREFIX)).await?;
        let metadata_keys = self
            .keys_matching(&format!("{}*", METADATA_PREFIX))
            .await?;

        self.delete_keys(&value_keys).await?;
        self.delete_keys(&metadata_keys).await?;

        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(STATS_KEY, "size", 0).await?;

        info!(
            "Redis cache cleared ({} values, {} metadata entries)",
            value_keys.len(),
            metadata_keys.len()
        );
        Ok(true)
    }

    // == Stats ==
    async fn get_stats(&self) -> Result<CacheStats> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, i64> = conn.hgetall(STATS_KEY).await?;
        Ok(CacheStats::from_fields(&fields))
    }

    fn kind(&self) -> &'static str {
        "redis"
    }
}
