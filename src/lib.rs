//! Wisp Cache - avatar caching core
//!
//! Caches avatar lookups behind one `CacheStore` contract with an in-memory
//! backend and a shared Redis backend.

pub mod avatar;
pub mod cache;
pub mod config;
pub mod error;

pub use avatar::{AvatarProvider, AvatarResolver, ProviderRegistry};
pub use cache::{open_store, CacheStore, CacheValue, Field};
pub use config::{BackendKind, CacheConfig};
pub use error::{AvatarError, CacheError};
