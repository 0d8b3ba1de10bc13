//! Error types for the avatar cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by a cache backend.
///
/// Malformed TTLs and undecodable payloads are not errors: they degrade to the
/// default TTL and to an absent value respectively.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The shared store could not be reached or rejected a command
    #[error("Cache backend unavailable: {0}")]
    Backend(#[from] redis::RedisError),

    /// A value or metadata record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key pattern could not be compiled
    #[error("Invalid key pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The zlib encoder failed
    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),
}

// == Avatar Error Enum ==
/// Errors raised while resolving an avatar for a caller.
#[derive(Error, Debug)]
pub enum AvatarError {
    /// No provider is registered under the requested name
    #[error("Unsupported service: {0}")]
    UnsupportedService(String),

    /// The identifier failed validation
    #[error("{0}")]
    InvalidIdentifier(String),

    /// An identifier rule pattern could not be compiled
    #[error("Invalid identifier rule: {0}")]
    Rule(#[from] regex::Error),

    /// The provider had no avatar for this identifier
    #[error("Avatar not found for {identifier} on {provider}")]
    NotFound { provider: String, identifier: String },

    /// The provider answered with an error status
    #[error("{message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    /// The HTTP client failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The cache backend failed
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
