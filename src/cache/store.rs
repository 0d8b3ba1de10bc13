//! Cache Store Module
//!
//! The contract every backend implements, and the startup factory that picks one.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cache::ttl::TtlInput;
use crate::cache::{CacheMetadata, CacheStats, CacheValue, MemoryCache, RedisCache};
use crate::config::{BackendKind, CacheConfig};
use crate::error::Result;

// == Cache Store ==
/// Uniform get/set/delete/stats contract over logical keys.
///
/// Implementations prefix keys internally, run values through the codec,
/// normalize TTLs, and keep a metadata entry beside every value entry.
#[async_trait]
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Returns the decoded value, or `None` when missing or expired.
    ///
    /// Counts a hit or a miss.
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Stores a value and its metadata under the same expiry.
    async fn set(&self, key: &str, value: &CacheValue, ttl: TtlInput) -> Result<bool>;

    /// Removes the value and metadata. Returns whether a value existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every entry whose logical key matches `pattern` (`*` wildcard).
    ///
    /// Returns the number of value entries removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize>;

    /// Returns the entry's timestamps, or `None` when missing or expired.
    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>>;

    /// Removes every value and metadata entry and zeroes `size`.
    async fn clear(&self) -> Result<bool>;

    async fn get_stats(&self) -> Result<CacheStats>;

    /// Short backend name for logs and stats envelopes.
    fn kind(&self) -> &'static str;
}

// == Open Store ==
/// Builds the process-wide store handle from configuration.
///
/// Called once at startup; the handle is then shared with every request.
pub async fn open_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryCache::from_config(config)),
        BackendKind::Redis => Arc::new(RedisCache::connect(config).await?),
    };

    info!(
        "Cache store initialized: backend={}, default_ttl={}s, ttl_range={}..={}s, compression={}",
        store.kind(),
        config.default_ttl,
        config.ttl_min,
        config.ttl_max,
        config.compression
    );

    Ok(store)
}
