//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Which cache backend the process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local map with lazy expiry
    Memory,
    /// Shared Redis store with native expiry
    Redis,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backend selected once at startup
    pub backend: BackendKind,
    /// TTL in seconds used when the requested one is absent or invalid
    pub default_ttl: u64,
    /// Smallest accepted TTL in seconds (inclusive); 0 is treated as 1
    pub ttl_min: u64,
    /// Largest accepted TTL in seconds (inclusive)
    pub ttl_max: u64,
    /// Compress encoded payloads with zlib
    pub compression: bool,
    /// Connection address of the shared store
    pub redis_url: String,
    /// Timeout for avatar downloads in milliseconds
    pub avatar_timeout_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TYPE` - `memory` or `redis` (default: memory)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `CACHE_TTL_MIN` - Minimum TTL in seconds (default: 3600)
    /// - `CACHE_TTL_MAX` - Maximum TTL in seconds (default: 2419200, 28 days)
    /// - `CACHE_COMPRESSION` - `true` or `false` (default: true)
    /// - `REDIS_URL` - Redis address (default: redis://localhost:6379/0)
    /// - `AVATAR_TIMEOUT` - Download timeout in milliseconds (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: parse_var("CACHE_TYPE").unwrap_or(defaults.backend),
            default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            ttl_min: parse_var("CACHE_TTL_MIN").unwrap_or(defaults.ttl_min),
            ttl_max: parse_var("CACHE_TTL_MAX").unwrap_or(defaults.ttl_max),
            compression: env::var("CACHE_COMPRESSION")
                .ok()
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.compression),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            avatar_timeout_ms: parse_var("AVATAR_TIMEOUT").unwrap_or(defaults.avatar_timeout_ms),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            default_ttl: 3600,
            ttl_min: 3600,
            ttl_max: 2_419_200,
            compression: true,
            redis_url: "redis://localhost:6379/0".to_string(),
            avatar_timeout_ms: 10_000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.ttl_min, 3600);
        assert_eq!(config.ttl_max, 2_419_200);
        assert!(config.compression);
        assert_eq!(config.redis_url, "redis://localhost:6379/0");
        assert_eq!(config.avatar_timeout_ms, 10_000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for var in [
            "CACHE_TYPE",
            "CACHE_DEFAULT_TTL",
            "CACHE_TTL_MIN",
            "CACHE_TTL_MAX",
            "CACHE_COMPRESSION",
            "REDIS_URL",
            "AVATAR_TIMEOUT",
        ] {
            env::remove_var(var);
        }

        let config = CacheConfig::from_env();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.default_ttl, 3600);
        assert!(config.compression);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("redis".parse::<BackendKind>(), Ok(BackendKind::Redis));
        assert_eq!(" Memory ".parse::<BackendKind>(), Ok(BackendKind::Memory));
        assert!("memcached".parse::<BackendKind>().is_err());
    }
}
