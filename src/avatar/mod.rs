//! Avatar Module
//!
//! Provider capability, download helpers and the cache-aside resolver that
//! sits in front of the cache store.

pub mod fetch;
mod provider;
mod resolver;
mod validation;

pub use provider::{AvatarProvider, ProviderRegistry, TemplateProvider, ID_PLACEHOLDER};
pub use resolver::{AvatarLookup, AvatarResolver, CacheStatus, URL_FIELD};
pub use validation::{validate_identifier, IdentifierRule, MAX_IDENTIFIER_LENGTH};
