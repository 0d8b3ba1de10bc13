//! Avatar Providers
//!
//! The capability every avatar source implements, and the registry that maps
//! service names (and aliases) to providers.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::avatar::validation::{validate_identifier, IdentifierRule};
use crate::error::AvatarError;

/// Placeholder substituted with the identifier in a URL template.
pub const ID_PLACEHOLDER: &str = "{id}";

// == Avatar Provider ==
/// Resolves an identifier to the URL of its avatar image.
#[async_trait]
pub trait AvatarProvider: Send + Sync {
    /// Lowercase service name, also the first half of cache keys.
    fn name(&self) -> &str;

    /// Checks an identifier before any cache or network access.
    fn validate(&self, identifier: &str) -> Result<(), AvatarError> {
        validate_identifier(identifier)
    }

    async fn avatar_url(&self, identifier: &str) -> Result<String, AvatarError>;
}

// == Template Provider ==
/// Provider whose avatar URL is a fixed template around the identifier.
#[derive(Debug, Clone)]
pub struct TemplateProvider {
    name: String,
    template: String,
    rule: Option<IdentifierRule>,
}

impl TemplateProvider {
    /// `template` must contain `{id}`.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            template: template.into(),
            rule: None,
        }
    }

    /// Requires identifiers to also pass `rule`.
    pub fn with_rule(mut self, rule: IdentifierRule) -> Self {
        self.rule = Some(rule);
        self
    }
}

#[async_trait]
impl AvatarProvider for TemplateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, identifier: &str) -> Result<(), AvatarError> {
        validate_identifier(identifier)?;
        match &self.rule {
            Some(rule) => rule.check(identifier),
            None => Ok(()),
        }
    }

    async fn avatar_url(&self, identifier: &str) -> Result<String, AvatarError> {
        Ok(self.template.replace(ID_PLACEHOLDER, identifier))
    }
}

// == Provider Registry ==
/// Providers by name, with aliases pointing at registered names.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn AvatarProvider>>,
    aliases: BTreeMap<String, String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn AvatarProvider>) -> &mut Self {
        self.providers
            .insert(provider.name().to_ascii_lowercase(), provider);
        self
    }

    /// Makes `alias` resolve to the provider registered as `target`.
    pub fn alias(&mut self, alias: &str, target: &str) -> &mut Self {
        self.aliases
            .insert(alias.to_ascii_lowercase(), target.to_ascii_lowercase());
        self
    }

    /// Case-insensitive lookup through aliases.
    pub fn get(&self, service: &str) -> Option<Arc<dyn AvatarProvider>> {
        let service = service.to_ascii_lowercase();
        let name = self.aliases.get(&service).unwrap_or(&service);
        self.providers.get(name).cloned()
    }

    /// Sorted service names, aliases appended as `name/alias`.
    pub fn service_names(&self) -> Vec<String> {
        self.providers
            .keys()
            .map(|name| {
                let aliases: Vec<&str> = self
                    .aliases
                    .iter()
                    .filter(|(_, target)| *target == name)
                    .map(|(alias, _)| alias.as_str())
                    .collect();
                if aliases.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", name, aliases.join("/"))
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}
