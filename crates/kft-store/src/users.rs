//! Username to id directory.
//!
//! Ids are handed out densely, starting at 1, in registration order and are never
//! reused. Id 0 belongs to the system and is never assigned.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use kft_core::{validate_username, UserId};

use crate::cache::CacheCell;
use crate::error::{Result, StoreError};
use crate::schema::cache;
use crate::KvStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserDirectory {
    id_to_username: BTreeMap<u8, String>,
    username_to_id: BTreeMap<String, u8>,
    admin: u8,
}

/// Bidirectional map between usernames and [`UserId`]s, plus the admin.
pub struct UserIndex {
    cell: CacheCell<UserDirectory>,
    state: Mutex<UserDirectory>,
}

impl UserIndex {
    /// Load the index from `store`, starting empty on first run.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the stored blob is corrupt and
    /// `StoreError::Database` if the substrate fails.
    pub fn load(store: Arc<dyn KvStore>) -> Result<Self> {
        let cell = CacheCell::new(store, cache::USERS);
        let state: UserDirectory = cell.load()?;
        tracing::debug!(count = state.username_to_id.len(), "Loaded user index");
        Ok(Self {
            cell,
            state: Mutex::new(state),
        })
    }

    /// Register `username` and return its id.
    ///
    /// A name that is already registered keeps its id and nothing is written.
    ///
    /// # Errors
    ///
    /// - `ValidationError::InvalidUsername` if the name is empty, over 15 bytes or
    ///   contains whitespace.
    /// - `StoreError::UserLimitReached` once 255 users exist.
    /// - The error from saving the blob.
    pub fn register(&self, username: &str) -> Result<UserId> {
        validate_username(username)?;
        let mut state = self.state.lock();
        if let Some(id) = state.username_to_id.get(username) {
            return Ok(UserId::new(*id));
        }

        let id = u8::try_from(state.username_to_id.len() + 1)
            .map_err(|_| StoreError::UserLimitReached)?;
        state.username_to_id.insert(username.to_string(), id);
        state.id_to_username.insert(id, username.to_string());
        self.cell.save(&state)?;

        tracing::info!(username, id, "Registered user");
        Ok(UserId::new(id))
    }

    /// The id of `username`, or [`UserId::SYSTEM`] (0) if it is not registered.
    #[must_use]
    pub fn lookup(&self, username: &str) -> UserId {
        self.state
            .lock()
            .username_to_id
            .get(username)
            .map_or(UserId::SYSTEM, |id| UserId::new(*id))
    }

    /// The username registered under `id`.
    #[must_use]
    pub fn reverse_lookup(&self, id: UserId) -> Option<String> {
        self.state.lock().id_to_username.get(&id.get()).cloned()
    }

    /// Whether `username` is registered.
    #[must_use]
    pub fn is_user(&self, username: &str) -> bool {
        self.state.lock().username_to_id.contains_key(username)
    }

    /// Number of registered users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.lock().username_to_id.len()
    }

    /// Make `username` the admin, registering it first if needed.
    ///
    /// # Errors
    ///
    /// Same as [`UserIndex::register`].
    pub fn set_admin(&self, username: &str) -> Result<UserId> {
        let id = self.register(username)?;
        let mut state = self.state.lock();
        if state.admin != id.get() {
            state.admin = id.get();
            self.cell.save(&state)?;
            tracing::info!(username, id = id.get(), "Admin set");
        }
        Ok(id)
    }

    /// The admin's id, if one was set.
    #[must_use]
    pub fn admin(&self) -> Option<UserId> {
        let admin = self.state.lock().admin;
        (admin != 0).then_some(UserId::new(admin))
    }

    /// Whether `username` is the admin.
    #[must_use]
    pub fn is_admin(&self, username: &str) -> bool {
        let state = self.state.lock();
        state
            .id_to_username
            .get(&state.admin)
            .is_some_and(|name| name == username)
    }

    /// Whether `id` is the admin's id.
    #[must_use]
    pub fn is_admin_id(&self, id: UserId) -> bool {
        self.admin() == Some(id)
    }
}
