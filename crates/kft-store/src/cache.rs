//! Single-key JSON blobs.
//!
//! A `CacheCell` owns one key in the cache table and knows how to turn its bytes into
//! a value of type `T` and back. The side indices keep their in-memory copy next to
//! the cell and call [`CacheCell::save`] after every mutation.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::keys::cache_key;
use crate::KvStore;

/// Load/save access to one JSON blob in the cache table.
pub struct CacheCell<T> {
    store: Arc<dyn KvStore>,
    name: &'static str,
    key: Vec<u8>,
    _shape: PhantomData<fn() -> T>,
}

impl<T> CacheCell<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Create a cell for the blob called `name`.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, name: &'static str) -> Self {
        Self {
            store,
            name,
            key: cache_key(name),
            _shape: PhantomData,
        }
    }

    /// Read the blob, or `T::default()` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the stored bytes are not valid JSON for
    /// `T`, and `StoreError::Database` if the substrate fails.
    pub fn load(&self) -> Result<T> {
        match self.store.get(&self.key)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => {
                tracing::debug!(cache = self.name, "Cache blob not found, starting empty");
                Ok(T::default())
            }
        }
    }

    /// Overwrite the blob with `value`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if `value` cannot be encoded and
    /// `StoreError::Database` if the write fails.
    pub fn save(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(&self.key, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError};
    use std::collections::BTreeMap;

    fn cell() -> (Arc<MemoryStore>, CacheCell<BTreeMap<String, u32>>) {
        let store = Arc::new(MemoryStore::new());
        let cell = CacheCell::new(store.clone(), "test");
        (store, cell)
    }

    #[test]
    fn missing_blob_loads_default() {
        let (_, cell) = cell();
        assert!(cell.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let (store, cell) = cell();
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1);
        cell.save(&value).unwrap();

        assert_eq!(cell.load().unwrap(), value);
        assert_eq!(store.get(b"\x00test").unwrap(), Some(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn corrupt_blob_is_a_decoding_error() {
        let (store, cell) = cell();
        store.set(b"\x00test", b"not json").unwrap();
        assert!(matches!(cell.load(), Err(StoreError::Serialization(_))));
    }
}
