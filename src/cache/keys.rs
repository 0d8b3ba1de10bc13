//! Key Space Module
//!
//! Prefixing of logical keys and glob pattern handling shared by both backends.

use regex::Regex;

use crate::error::Result;

/// Prefix for value entries.
pub const VALUE_PREFIX: &str = "wisp:cache:";

/// Prefix for metadata entries.
pub const METADATA_PREFIX: &str = "wisp:metadata:";

/// Hash holding the shared-store counters. Kept outside both prefixes.
pub const STATS_KEY: &str = "wisp:stats";

pub fn value_key(key: &str) -> String {
    format!("{}{}", VALUE_PREFIX, key)
}

pub fn metadata_key(key: &str) -> String {
    format!("{}{}", METADATA_PREFIX, key)
}

/// Returns the logical key of a prefixed value key.
pub fn logical_key(value_key: &str) -> Option<&str> {
    value_key.strip_prefix(VALUE_PREFIX)
}

/// Builds a composite `service:identifier` key.
pub fn composite_key(service: &str, identifier: &str) -> String {
    format!("{}:{}", service, identifier)
}

// == Key Pattern ==
/// A glob over logical keys where `*` matches any substring.
///
/// The whole key must match; every other character is literal.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    glob: String,
    regex: Regex,
}

impl KeyPattern {
    pub fn new(glob: &str) -> Result<Self> {
        let body = glob
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^(?s:{})$", body))?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The same pattern in Redis `KEYS` syntax under `prefix`.
    ///
    /// Redis treats `?`, `[`, `]` and `\` specially, so they are escaped to
    /// keep `*` the only wildcard.
    pub fn to_redis_glob(&self, prefix: &str) -> String {
        let mut out = String::with_capacity(prefix.len() + self.glob.len());
        for c in prefix.chars().chain(self.glob.chars()) {
            if matches!(c, '?' | '[' | ']' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}
