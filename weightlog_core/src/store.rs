//! Storage collaborator contract and an in-memory implementation.

use crate::{Result, UserRecord};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Document store keyed by user id.
///
/// `fetch` signals absence with `Ok(None)`; errors are reserved for real
/// storage failures. `upsert` replaces the whole document.
pub trait UserStore {
    fn fetch(&self, user_id: &str) -> Result<Option<UserRecord>>;

    fn upsert(&self, user: UserRecord) -> Result<UserRecord>;

    /// Fetch, mutate and persist a record. Returns `Ok(None)` without
    /// writing when the user does not exist.
    ///
    /// The provided implementation is a plain read-modify-write: two
    /// concurrent callers on the same id can lose one update. Stores that
    /// can serialize writers override this.
    fn modify<F>(&self, user_id: &str, f: F) -> Result<Option<UserRecord>>
    where
        Self: Sized,
        F: FnOnce(&mut UserRecord) -> Result<()>,
    {
        let Some(mut user) = self.fetch(user_id)? else {
            return Ok(None);
        };
        f(&mut user)?;
        self.upsert(user).map(Some)
    }
}

/// Process-local store, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserRecord>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl UserStore for MemoryStore {
    fn fetch(&self, user_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.lock().get(user_id).cloned())
    }

    fn upsert(&self, user: UserRecord) -> Result<UserRecord> {
        self.lock().insert(user.id.clone(), user.clone());
        Ok(user)
    }

    // Runs entirely under the map lock, so in-process writers never clobber
    // each other. A failing closure leaves the stored record untouched.
    fn modify<F>(&self, user_id: &str, f: F) -> Result<Option<UserRecord>>
    where
        F: FnOnce(&mut UserRecord) -> Result<()>,
    {
        let mut users = self.lock();
        let Some(current) = users.get(user_id) else {
            return Ok(None);
        };
        let mut user = current.clone();
        f(&mut user)?;
        users.insert(user_id.to_string(), user.clone());
        Ok(Some(user))
    }
}
