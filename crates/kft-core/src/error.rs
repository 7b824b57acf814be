//! Error types for kft core types.

/// Result type for validation of caller-supplied values.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Input rejected before any mutation takes place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Tag is empty, too long, or contains characters that cannot be padded.
    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag {
        /// The rejected tag.
        tag: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The tag is reserved for system-generated entries.
    #[error("tag {0:?} is reserved")]
    ReservedTag(String),

    /// User id 0 is reserved for system-generated entries.
    #[error("user id 0 is reserved for system entries")]
    ReservedUser,

    /// Username is too long or contains whitespace.
    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    /// Amount could not be parsed or does not fit in cents.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Month could not be parsed.
    #[error("invalid month: {0}")]
    InvalidMonth(String),

    /// Timestamp cannot be represented as `i64` nanoseconds since the epoch.
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(String),
}
