//! Cache Module
//!
//! Pluggable key-value cache with TTL expiry, binary-safe encoding, metadata
//! tracking and pattern invalidation, behind one `CacheStore` trait with an
//! in-memory and a Redis backend.

mod clock;
mod codec;
mod entry;
pub mod keys;
mod memory;
mod remote;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CacheValue, Codec, Field, BINARY_FIELD};
pub use entry::{CacheEntry, CacheMetadata, MetadataRecord};
pub use memory::MemoryCache;
pub use remote::RedisCache;
pub use stats::CacheStats;
pub use store::{open_store, CacheStore};
pub use ttl::{TtlInput, TtlPolicy, MIN_TTL_SECONDS};
