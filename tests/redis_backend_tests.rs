//! Integration Tests for the Redis Backend
//!
//! These need a disposable Redis server at `REDIS_URL` (default
//! `redis://localhost:6379/0`) and flush its `wisp:*` keys. Run with
//! `cargo test -- --ignored`.

use wisp_cache::cache::{CacheStore, CacheValue, Field, RedisCache, TtlInput, BINARY_FIELD};
use wisp_cache::{BackendKind, CacheConfig, CacheError};

// == Helper Functions ==

fn redis_config() -> CacheConfig {
    let mut config = CacheConfig::from_env();
    config.backend = BackendKind::Redis;
    config.ttl_min = 1;
    config
}

async fn fresh_store() -> RedisCache {
    let store = RedisCache::connect(&redis_config()).await.unwrap();
    store.clear().await.unwrap();
    store
}

fn avatar(bytes: &[u8]) -> CacheValue {
    let mut value = CacheValue::new();
    value.insert(BINARY_FIELD.to_string(), Field::Bytes(bytes.to_vec()));
    value.insert("image_url".to_string(), "https://gh.test/a.png".into());
    value
}

#[tokio::test]
async fn test_unreachable_server_is_backend_error() {
    let config = CacheConfig {
        backend: BackendKind::Redis,
        redis_url: "redis://127.0.0.1:1/0".to_string(),
        ..CacheConfig::default()
    };

    let result = RedisCache::connect(&config).await;
    assert!(matches!(result, Err(CacheError::Backend(_))));
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_roundtrip_and_metadata() {
    let store = fresh_store().await;

    store.set("redis-test:alice", &avatar(b"\x00\x01\x02"), 60_i64.into()).await.unwrap();
    assert_eq!(store.get("redis-test:alice").await.unwrap(), Some(avatar(b"\x00\x01\x02")));

    let metadata = store.get_metadata("redis-test:alice").await.unwrap().unwrap();
    assert_eq!(metadata.status, "hit");

    assert!(store.delete("redis-test:alice").await.unwrap());
    assert!(store.get("redis-test:alice").await.unwrap().is_none());
    assert!(store.get_metadata("redis-test:alice").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_native_expiry() {
    let store = fresh_store().await;

    store.set("redis-test:short", &avatar(b"a"), 1_i64.into()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    assert!(store.get("redis-test:short").await.unwrap().is_none());
    assert!(store.get_metadata("redis-test:short").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_delete_pattern_and_size() {
    let store = fresh_store().await;

    for key in ["svc:alice", "svc:bob", "other:alice"] {
        store.set(key, &avatar(b"a"), TtlInput::Absent).await.unwrap();
    }
    // Overwrite does not grow size
    store.set("svc:alice", &avatar(b"b"), TtlInput::Absent).await.unwrap();
    assert_eq!(store.get_stats().await.unwrap().size, 3);

    assert_eq!(store.delete_pattern("svc:*").await.unwrap(), 2);
    assert!(store.get("other:alice").await.unwrap().is_some());
    assert_eq!(store.get_stats().await.unwrap().size, 1);
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_clear_keeps_hit_and_miss_counters() {
    let store = fresh_store().await;
    let before = store.get_stats().await.unwrap();

    store.set("redis-test:k", &avatar(b"a"), TtlInput::Absent).await.unwrap();
    store.get("redis-test:k").await.unwrap();
    store.get("redis-test:missing").await.unwrap();

    store.clear().await.unwrap();
    store.clear().await.unwrap();

    let after = store.get_stats().await.unwrap();
    assert_eq!(after.hits, before.hits + 1);
    assert_eq!(after.misses, before.misses + 1);
    assert_eq!(after.size, 0);
}
