//! Identifier validation.

use regex::Regex;

use crate::error::AvatarError;

/// Longest identifier accepted, in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 100;

const FORBIDDEN_CHARS: [char; 4] = ['<', '>', '"', '\''];

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const DOMAIN_PATTERN: &str = r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$";

/// Rejects empty, overlong, or markup-bearing identifiers.
pub fn validate_identifier(identifier: &str) -> Result<(), AvatarError> {
    if identifier.is_empty() {
        return Err(AvatarError::InvalidIdentifier(
            "Username is required".to_string(),
        ));
    }
    if identifier.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(AvatarError::InvalidIdentifier(
            "Username is too long".to_string(),
        ));
    }
    if identifier.contains(FORBIDDEN_CHARS) {
        return Err(AvatarError::InvalidIdentifier(
            "Username contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

// == Identifier Rule ==
/// A service-specific shape an identifier must have on top of the generic checks.
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    pattern: Regex,
    message: String,
}

impl IdentifierRule {
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, AvatarError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    /// Identifier must be an email address.
    pub fn email() -> Result<Self, AvatarError> {
        Self::new(EMAIL_PATTERN, "Invalid email format")
    }

    /// Identifier must be a domain name.
    pub fn domain() -> Result<Self, AvatarError> {
        Self::new(DOMAIN_PATTERN, "Invalid domain format")
    }

    pub fn check(&self, identifier: &str) -> Result<(), AvatarError> {
        if self.pattern.is_match(identifier) {
            Ok(())
        } else {
            Err(AvatarError::InvalidIdentifier(self.message.clone()))
        }
    }
}
