//! The set of known tags.
//!
//! Grows monotonically and is re-persisted in full on every new tag. The mutex is
//! the single writer for the blob: `register` holds it across the read-modify-write
//! so two concurrent registrations cannot lose each other's tag.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use kft_core::validate_tag;

use crate::cache::CacheCell;
use crate::error::Result;
use crate::schema::cache;
use crate::KvStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TagSet {
    tags: BTreeSet<String>,
}

/// Index of every tag ever used in the ledger.
pub struct TagIndex {
    cell: CacheCell<TagSet>,
    state: Mutex<TagSet>,
}

impl TagIndex {
    /// Load the index from `store`, starting empty on first run.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the stored blob is corrupt and
    /// `StoreError::Database` if the substrate fails.
    pub fn load(store: Arc<dyn KvStore>) -> Result<Self> {
        let cell = CacheCell::new(store, cache::TAGS);
        let state: TagSet = cell.load()?;
        tracing::debug!(count = state.tags.len(), "Loaded tag index");
        Ok(Self {
            cell,
            state: Mutex::new(state),
        })
    }

    /// Whether `tag` has been registered.
    #[must_use]
    pub fn is_known(&self, tag: &str) -> bool {
        self.state.lock().tags.contains(tag)
    }

    /// Register `tag`, returning `true` if it was new.
    ///
    /// Registering a known tag is a no-op. If persisting fails the tag stays in the
    /// in-memory set, so it is visible to this process but may be missing from the
    /// store after a restart.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTag` for tags that cannot be stored, or the
    /// error from saving the blob.
    pub fn register(&self, tag: &str) -> Result<bool> {
        validate_tag(tag)?;
        let mut state = self.state.lock();
        if !state.tags.insert(tag.to_string()) {
            return Ok(false);
        }
        self.cell.save(&state)?;
        tracing::debug!(tag, "Registered new tag");
        Ok(true)
    }

    /// Every known tag in ascending lexicographic order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.state.lock().tags.iter().cloned().collect()
    }

    /// Number of known tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().tags.len()
    }

    /// Whether no tag is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn register_is_idempotent() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let tags = TagIndex::load(store).unwrap();

        assert!(tags.register("food").unwrap());
        assert!(!tags.register("food").unwrap());
        assert_eq!(tags.snapshot(), vec!["food".to_string()]);
    }

    #[test]
    fn snapshot_is_sorted() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let tags = TagIndex::load(store).unwrap();
        for tag in ["rent", "food", "cat-toys", "utils:electricity"] {
            tags.register(tag).unwrap();
        }
        assert_eq!(
            tags.snapshot(),
            vec!["cat-toys", "food", "rent", "utils:electricity"]
        );
    }

    #[test]
    fn survives_reload() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        {
            let tags = TagIndex::load(Arc::clone(&store)).unwrap();
            tags.register("food").unwrap();
            tags.register("rent").unwrap();
        }
        let tags = TagIndex::load(store).unwrap();
        assert!(tags.is_known("food"));
        assert!(tags.is_known("rent"));
        assert!(!tags.is_known("fun"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn rejects_invalid_tags() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let tags = TagIndex::load(store).unwrap();
        assert!(tags.register(&"x".repeat(33)).is_err());
        assert!(tags.is_empty());
    }
}
