//! User identifiers and tag/username validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Maximum tag length in bytes. Tags are space padded to this width inside keys.
pub const MAX_TAG_LENGTH: usize = 32;

/// Tag reserved for the month-end summary entries written by the scheduler.
pub const SUMMARY_TAG: &str = "summary";

/// Maximum username length in bytes.
pub const MAX_USERNAME_LENGTH: usize = 15;

/// A compact user identifier.
///
/// Real users get ids 1 through 255 in registration order. Id 0 is
/// [`UserId::SYSTEM`], used for entries the ledger writes itself, and doubles as the
/// "unknown user" answer of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u8);

impl UserId {
    /// The system user.
    pub const SYSTEM: Self = Self(0);

    /// Create a `UserId` from its raw byte.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// The raw byte.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether this is the system id (also the "not found" sentinel).
    #[must_use]
    pub const fn is_system(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that `tag` can be stored in a ledger key.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTag` if the tag is empty, longer than
/// [`MAX_TAG_LENGTH`] bytes, or contains whitespace or control characters.
pub fn validate_tag(tag: &str) -> Result<()> {
    let reason = if tag.is_empty() {
        "empty"
    } else if tag.len() > MAX_TAG_LENGTH {
        "longer than 32 bytes"
    } else if tag.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "contains whitespace"
    } else {
        return Ok(());
    };
    Err(ValidationError::InvalidTag {
        tag: tag.to_string(),
        reason,
    })
}

/// Check that `username` is acceptable for the user index.
///
/// # Errors
///
/// Returns `ValidationError::InvalidUsername` if the name is empty, longer than
/// [`MAX_USERNAME_LENGTH`] bytes, or contains whitespace.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty()
        || username.len() > MAX_USERNAME_LENGTH
        || username.chars().any(char::is_whitespace)
    {
        return Err(ValidationError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_length_limit() {
        assert!(validate_tag(&"a".repeat(32)).is_ok());
        assert!(matches!(
            validate_tag(&"a".repeat(33)),
            Err(ValidationError::InvalidTag { .. })
        ));
    }

    #[test]
    fn tag_rejects_blank_and_spaces() {
        assert!(validate_tag("").is_err());
        assert!(validate_tag("cat food").is_err());
        assert!(validate_tag("food\n").is_err());
        assert!(validate_tag("utils:electricity").is_ok());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("fifteen_chars__").is_ok());
        assert!(validate_username("sixteen_chars___").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn system_id_is_zero() {
        assert!(UserId::SYSTEM.is_system());
        assert!(!UserId::new(1).is_system());
        assert_eq!(UserId::new(7).get(), 7);
    }
}
