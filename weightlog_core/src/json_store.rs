//! JSON-document user store with file locking.
//!
//! One document per user under `<root>/users/`. Writes are atomic
//! (temp file, fsync, rename), so readers take no lock and always see a
//! complete document. Writers hold an exclusive per-user lock file across
//! the whole read-modify-write.

use crate::store::UserStore;
use crate::{Error, Result, UserRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-per-user JSON store
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    users_dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `data_dir`. Nothing is touched on disk
    /// until the first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            users_dir: data_dir.into().join("users"),
        }
    }

    pub fn users_dir(&self) -> &Path {
        &self.users_dir
    }

    /// Path of the JSON document for a user
    pub fn document_path(&self, user_id: &str) -> PathBuf {
        self.users_dir.join(format!("{}.json", encode_user_id(user_id)))
    }

    fn lock_path(&self, user_id: &str) -> PathBuf {
        self.users_dir.join(format!("{}.lock", encode_user_id(user_id)))
    }

    fn ensure_users_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.users_dir)?;
        Ok(())
    }

    fn read_document(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let path = self.document_path(user_id);
        if !path.exists() {
            tracing::debug!("No document for user {} at {:?}", user_id, path);
            return Ok(None);
        }

        // The path is only ever replaced by rename, never written in place
        let mut contents = String::new();
        std::io::BufReader::new(File::open(&path)?).read_to_string(&mut contents)?;

        match serde_json::from_str::<UserRecord>(&contents) {
            Ok(user) => {
                tracing::debug!("Loaded user {} from {:?}", user_id, path);
                Ok(Some(user))
            }
            Err(e) => {
                tracing::warn!("Corrupt document for user {} at {:?}: {}", user_id, path, e);
                Err(Error::Storage(format!(
                    "corrupt document {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    fn write_document(&self, user: &UserRecord) -> Result<()> {
        self.ensure_users_dir()?;
        let path = self.document_path(&user.id);

        // Temp file in the same directory so the rename stays atomic
        let temp = NamedTempFile::new_in(&self.users_dir)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, user)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user {} to {:?}", user.id, path);
        Ok(())
    }

    /// Exclusive per-user lock, released when the returned file drops
    fn lock_user(&self, user_id: &str) -> Result<File> {
        self.ensure_users_dir()?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path(user_id))?;
        lock.lock_exclusive()?;
        Ok(lock)
    }
}

impl UserStore for JsonFileStore {
    fn fetch(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.read_document(user_id)
    }

    fn upsert(&self, user: UserRecord) -> Result<UserRecord> {
        let lock = self.lock_user(&user.id)?;
        self.write_document(&user)?;
        lock.unlock()?;
        Ok(user)
    }

    fn modify<F>(&self, user_id: &str, f: F) -> Result<Option<UserRecord>>
    where
        F: FnOnce(&mut UserRecord) -> Result<()>,
    {
        let lock = self.lock_user(user_id)?;

        let Some(mut user) = self.read_document(user_id)? else {
            lock.unlock()?;
            return Ok(None);
        };
        f(&mut user)?;
        self.write_document(&user)?;

        lock.unlock()?;
        Ok(Some(user))
    }
}

/// Map an opaque user id to a file-safe name.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`. The mapping is injective, so distinct ids never share a file.
pub fn encode_user_id(user_id: &str) -> String {
    let mut out = String::with_capacity(user_id.len());
    for b in user_id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    if out.is_empty() {
        out.push('%');
    }
    out
}
