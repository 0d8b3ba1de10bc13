//! Avatar Resolver
//!
//! Cache-aside lookup: read `service:identifier` from the store, and on a miss
//! ask the provider for the URL, download the image and cache both.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::avatar::fetch::{download_image, http_client};
use crate::avatar::provider::{AvatarProvider, ProviderRegistry};
use crate::cache::keys::composite_key;
use crate::cache::{CacheMetadata, CacheStore, CacheValue, Field, TtlInput, BINARY_FIELD};
use crate::config::CacheConfig;
use crate::error::AvatarError;

/// Field holding the avatar's source URL.
pub const URL_FIELD: &str = "image_url";

// == Cache Status ==
/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CacheStatus {
    /// Timestamps are absent when the metadata entry is missing
    Hit {
        #[serde(skip_serializing_if = "Option::is_none")]
        stored_at: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<String>,
    },
    Miss,
}

impl From<Option<CacheMetadata>> for CacheStatus {
    fn from(metadata: Option<CacheMetadata>) -> Self {
        match metadata {
            Some(metadata) => CacheStatus::Hit {
                stored_at: Some(metadata.stored_at),
                expires_at: Some(metadata.expires_at),
            },
            None => CacheStatus::Hit {
                stored_at: None,
                expires_at: None,
            },
        }
    }
}

// == Avatar Lookup ==
/// A resolved avatar. The image bytes are left out of JSON renderings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarLookup {
    pub service: String,
    pub username: String,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub image_data: Option<Vec<u8>>,
    pub cache: CacheStatus,
}

impl AvatarLookup {
    fn from_cached(service: &str, username: &str, value: &CacheValue, cache: CacheStatus) -> Self {
        Self {
            service: service.to_string(),
            username: username.to_string(),
            image_url: value
                .get(URL_FIELD)
                .and_then(Field::as_str)
                .map(str::to_string),
            image_data: value
                .get(BINARY_FIELD)
                .and_then(Field::as_bytes)
                .map(<[u8]>::to_vec),
            cache,
        }
    }
}

// == Avatar Resolver ==
/// Resolves avatars through a shared store handle.
#[derive(Debug, Clone)]
pub struct AvatarResolver {
    store: Arc<dyn CacheStore>,
    providers: ProviderRegistry,
    client: Client,
}

impl AvatarResolver {
    pub fn new(store: Arc<dyn CacheStore>, providers: ProviderRegistry, client: Client) -> Self {
        Self {
            store,
            providers,
            client,
        }
    }

    /// Builds a resolver whose downloads honour `config.avatar_timeout_ms`.
    pub fn from_config(
        store: Arc<dyn CacheStore>,
        providers: ProviderRegistry,
        config: &CacheConfig,
    ) -> Result<Self, AvatarError> {
        let client = http_client(config.avatar_timeout_ms)?;
        Ok(Self::new(store, providers, client))
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    fn provider(&self, service: &str, identifier: &str) -> Result<Arc<dyn AvatarProvider>, AvatarError> {
        let provider = self
            .providers
            .get(service)
            .ok_or_else(|| AvatarError::UnsupportedService(service.to_string()))?;
        provider.validate(identifier)?;
        Ok(provider)
    }

    // == Resolve ==
    /// Returns the avatar for `identifier` on `service`.
    ///
    /// Aliases share the canonical provider's cache entries.
    pub async fn resolve(
        &self,
        service: &str,
        identifier: &str,
        ttl: TtlInput,
    ) -> Result<AvatarLookup, AvatarError> {
        let provider = self.provider(service, identifier)?;
        let key = composite_key(provider.name(), identifier);

        if let Some(cached) = self.store.get(&key).await? {
            let metadata = self.store.get_metadata(&key).await?;
            debug!("Serving cached avatar for {}", key);
            return Ok(AvatarLookup::from_cached(
                provider.name(),
                identifier,
                &cached,
                metadata.into(),
            ));
        }

        let image_url = provider.avatar_url(identifier).await?;
        if image_url.is_empty() {
            return Err(AvatarError::NotFound {
                provider: provider.name().to_string(),
                identifier: identifier.to_string(),
            });
        }

        let image_data = download_image(&self.client, &image_url).await;

        let mut value = CacheValue::new();
        value.insert(
            BINARY_FIELD.to_string(),
            image_data
                .clone()
                .map_or(Field::Json(Value::Null), Field::Bytes),
        );
        value.insert(URL_FIELD.to_string(), image_url.clone().into());
        self.store.set(&key, &value, ttl).await?;

        info!("Cached avatar for {} from {}", key, image_url);
        Ok(AvatarLookup {
            service: provider.name().to_string(),
            username: identifier.to_string(),
            image_url: Some(image_url),
            image_data,
            cache: CacheStatus::Miss,
        })
    }

    // == Resolve Batch ==
    /// Resolves several `(service, identifier)` pairs, one result per service.
    ///
    /// A failure affects only its own entry. Cached entries without a URL are
    /// reported as not found. A service named twice keeps the last result.
    pub async fn resolve_batch(
        &self,
        requests: &[(&str, &str)],
        ttl: TtlInput,
    ) -> BTreeMap<String, Result<AvatarLookup, AvatarError>> {
        let mut results = BTreeMap::new();
        for (service, identifier) in requests {
            let result = self
                .resolve(service, identifier, ttl.clone())
                .await
                .and_then(|lookup| {
                    if lookup.image_url.as_deref().is_some_and(|url| !url.is_empty()) {
                        Ok(lookup)
                    } else {
                        Err(AvatarError::NotFound {
                            provider: lookup.service,
                            identifier: lookup.username,
                        })
                    }
                });
            if let Err(e) = &result {
                warn!("Batch lookup for {}:{} failed: {}", service, identifier, e);
            }
            results.insert(service.to_string(), result);
        }
        results
    }

    // == Invalidate ==
    /// Drops the cached avatar. Returns whether an entry was removed.
    pub async fn invalidate(&self, service: &str, identifier: &str) -> Result<bool, AvatarError> {
        let provider = self.provider(service, identifier)?;
        let key = composite_key(provider.name(), identifier);
        Ok(self.store.delete(&key).await?)
    }
}
