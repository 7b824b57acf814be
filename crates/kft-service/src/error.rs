//! Ledger service error types.

use kft_core::ValidationError;
use kft_store::StoreError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by the ledger service and the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Storage failed, or stored data could not be decoded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Input rejected before any mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The transaction was written, but its tag could not be added to the tag index.
    ///
    /// The ledger entry is durable: callers must not retry the add.
    #[error("transaction stored but tag registration failed: {source}")]
    TagRegistration {
        /// Why the tag index could not be saved.
        source: StoreError,
    },

    /// A balance does not fit in cents.
    #[error("balance overflow in {scope}")]
    BalanceOverflow {
        /// The month, and tag if any, being summed.
        scope: String,
    },

    /// The scheduler task failed outside of a ledger operation.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

impl LedgerError {
    /// Whether the failed call may still have written a ledger entry.
    #[must_use]
    pub const fn entry_was_stored(&self) -> bool {
        matches!(self, Self::TagRegistration { .. })
    }
}
