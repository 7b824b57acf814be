//! Ordered key-value storage for the kft ledger.
//!
//! This crate provides the byte-level substrate the ledger is built on, the key codec
//! that makes range aggregation a plain prefix scan, and the small JSON side tables
//! kept next to the ledger.
//!
//! # Layout
//!
//! Keys live in two namespaces told apart by their first byte:
//!
//! - table `0`: fixed-key JSON blobs (`tags`, `users`, `periods`)
//! - table `1`: ledger entries, keyed by `month[6] || tag[32] || timestamp[8]`
//!
//! Byte order of ledger keys equals (table, month, tag, timestamp) order, so every
//! month, and every tag within a month, is one contiguous key range.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kft_store::{KvStore, MemoryStore, TagIndex};
//!
//! let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
//! let tags = TagIndex::load(Arc::clone(&store)).unwrap();
//! tags.register("food").unwrap();
//! assert!(tags.is_known("food"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod error;
pub mod keys;
pub mod memory;
pub mod periods;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;
pub mod tags;
pub mod users;

pub use cache::CacheCell;
pub use error::{Result, StoreError};
pub use keys::{KeyScope, LedgerKey};
pub use memory::MemoryStore;
pub use periods::PeriodState;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;
pub use tags::TagIndex;
pub use users::UserIndex;

/// What a prefix scan visitor wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Keep visiting matching keys.
    Continue,
    /// Stop the scan; the iteration returns `Ok(())`.
    Stop,
}

/// The ordered key-value substrate.
///
/// Implementations must write single keys atomically and iterate keys in ascending
/// byte order. Nothing more is assumed: there are no multi-key transactions.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the substrate fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the substrate fails.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Visit every key starting with `prefix`, in ascending key order.
    ///
    /// The visitor is called once per entry and may end the scan early by returning
    /// [`Scan::Stop`]. An error returned by the visitor aborts the scan and is passed
    /// through unchanged. The visitor must not write to the same store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the substrate fails, or the visitor's error.
    fn iterate_prefix(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<Scan>,
    ) -> Result<()>;
}
