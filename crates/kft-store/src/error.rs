//! Error types for kft storage.

use kft_core::ValidationError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The substrate failed to read or write.
    #[error("database error: {0}")]
    Database(String),

    /// Stored bytes are not valid JSON for the expected shape, or a key field could
    /// not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A ledger key does not have the fixed layout length.
    #[error("malformed key: expected {expected} bytes, got {actual}")]
    MalformedKey {
        /// Length of a well-formed key.
        expected: usize,
        /// Length of the key that was read.
        actual: usize,
    },

    /// Input rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every user id from 1 to 255 is taken.
    #[error("user limit reached")]
    UserLimitReached,
}

impl StoreError {
    /// Whether this error means stored data could not be decoded.
    #[must_use]
    pub const fn is_decoding(&self) -> bool {
        matches!(self, Self::Serialization(_) | Self::MalformedKey { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
