//! Integration Tests for the Memory Backend
//!
//! Exercises the store through the public `CacheStore` handle, the way a
//! request handler would.

use std::sync::Arc;

use wisp_cache::cache::{
    CacheStats, CacheStore, CacheValue, Codec, Field, ManualClock, MemoryCache, TtlInput,
    TtlPolicy, BINARY_FIELD,
};
use wisp_cache::{open_store, CacheConfig};

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wisp_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn create_test_store() -> (Arc<dyn CacheStore>, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::default());
    let store = MemoryCache::with_clock(Codec::new(true), TtlPolicy::new(3600, 1, 86_400), clock.clone());
    (Arc::new(store), clock)
}

fn avatar(bytes: &[u8], url: &str) -> CacheValue {
    let mut value = CacheValue::new();
    value.insert(BINARY_FIELD.to_string(), Field::Bytes(bytes.to_vec()));
    value.insert("image_url".to_string(), url.into());
    value
}

// == Round Trip ==

#[tokio::test]
async fn test_set_then_get_roundtrips_binary() {
    let (store, _) = create_test_store();
    let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

    store
        .set("github:octocat", &avatar(&png, "https://gh.test/octocat.png"), 60_i64.into())
        .await
        .unwrap();

    let cached = store.get("github:octocat").await.unwrap().unwrap();
    assert_eq!(cached[BINARY_FIELD].as_bytes(), Some(&png[..]));
    assert_eq!(cached["image_url"].as_str(), Some("https://gh.test/octocat.png"));
}

#[tokio::test]
async fn test_uncompressed_store_roundtrips() {
    let store = MemoryCache::new(Codec::new(false), TtlPolicy::default());
    let value = avatar(b"raw", "u");

    store.set("k", &value, TtlInput::Absent).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(value));
}

// == Stats ==

#[tokio::test]
async fn test_stats_miss_set_hit() {
    let (store, _) = create_test_store();
    assert_eq!(store.get_stats().await.unwrap(), CacheStats::new());

    assert!(store.get("svc:alice").await.unwrap().is_none());
    store.set("svc:alice", &avatar(b"a", "u"), TtlInput::Absent).await.unwrap();
    assert!(store.get("svc:alice").await.unwrap().is_some());

    let stats = store.get_stats().await.unwrap();
    assert_eq!(stats, CacheStats { hits: 1, misses: 1, size: 1 });
    assert_eq!(stats.hit_rate(), 0.5);
}

// == Expiry ==

#[tokio::test]
async fn test_expired_entry_is_absent_and_uncounted() {
    let (store, clock) = create_test_store();

    store.set("svc:alice", &avatar(b"a", "u"), 1_i64.into()).await.unwrap();
    clock.advance(2);

    assert!(store.get("svc:alice").await.unwrap().is_none());
    assert!(store.get_metadata("svc:alice").await.unwrap().is_none());
    assert_eq!(store.get_stats().await.unwrap().size, 0);
}

#[tokio::test]
async fn test_out_of_range_ttl_falls_back_to_default() {
    let (store, clock) = create_test_store();

    // Above the maximum, so the 3600s default applies
    store.set("svc:alice", &avatar(b"a", "u"), 999_999_i64.into()).await.unwrap();
    clock.advance(3600);
    assert!(store.get("svc:alice").await.unwrap().is_some());
    clock.advance(1);
    assert!(store.get("svc:alice").await.unwrap().is_none());
}

// == Delete ==

#[tokio::test]
async fn test_delete_removes_value_and_metadata() {
    let (store, _) = create_test_store();

    store.set("svc:alice", &avatar(b"a", "u"), TtlInput::Absent).await.unwrap();
    assert!(store.get_metadata("svc:alice").await.unwrap().is_some());

    assert!(store.delete("svc:alice").await.unwrap());
    assert!(store.get("svc:alice").await.unwrap().is_none());
    assert!(store.get_metadata("svc:alice").await.unwrap().is_none());
    assert!(!store.delete("svc:alice").await.unwrap());
}

#[tokio::test]
async fn test_delete_pattern_scopes_to_service() {
    let (store, _) = create_test_store();
    for key in ["svc:alice", "svc:bob", "other:alice"] {
        store.set(key, &avatar(b"a", key), TtlInput::Absent).await.unwrap();
    }

    assert_eq!(store.delete_pattern("svc:*").await.unwrap(), 2);
    assert!(store.get("other:alice").await.unwrap().is_some());
    assert_eq!(store.get_stats().await.unwrap().size, 1);

    assert_eq!(store.delete_pattern("nothing:*").await.unwrap(), 0);
}

// == Clear ==

#[tokio::test]
async fn test_clear_twice_is_idempotent() {
    let (store, _) = create_test_store();
    store.set("svc:alice", &avatar(b"a", "u"), TtlInput::Absent).await.unwrap();

    assert!(store.clear().await.unwrap());
    assert_eq!(store.get_stats().await.unwrap().size, 0);
    assert!(store.clear().await.unwrap());
    assert_eq!(store.get_stats().await.unwrap().size, 0);
    assert!(store.get("svc:alice").await.unwrap().is_none());
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_keeps_counters_exact() {
    let (store, _) = create_test_store();
    let mut handles = Vec::new();

    for task in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                let key = format!("svc:{}", i);
                store.set(&key, &avatar(b"a", "u"), TtlInput::Absent).await.unwrap();
                store.get(&key).await.unwrap();
                store.get(&format!("missing:{}:{}", task, i)).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = store.get_stats().await.unwrap();
    assert_eq!(stats.hits, 400);
    assert_eq!(stats.misses, 400);
    assert_eq!(stats.size, 50);
}

// == Startup Handle ==

#[tokio::test]
async fn test_open_store_from_default_config() {
    let store = open_store(&CacheConfig::default()).await.unwrap();
    assert_eq!(store.kind(), "memory");

    // Default bounds reject a 10s TTL, but the write still succeeds
    assert!(store.set("svc:alice", &avatar(b"a", "u"), "10".into()).await.unwrap());
    assert!(store.get_metadata("svc:alice").await.unwrap().is_some());
}
