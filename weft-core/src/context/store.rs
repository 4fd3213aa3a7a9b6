//! Session Stores
//!
//! On disconnect the session protocol extracts the persistent subset of a
//! context's state and hands it to a store; on reconnect with the same
//! session identifier the snapshot is loaded back. The store is pluggable:
//! implement [`SessionStore`] for Redis, a database, or anything else.
//!
//! Two implementations ship here: [`MemoryStore`] for development and
//! single-instance deployments, and [`FileStore`] persisting one
//! MessagePack-encoded file per session.

use std::fs;
use std::io;
use std::path::PathBuf;

use dashmap::DashMap;
use thiserror::Error;

use super::state::StateSnapshot;

/// Session store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Snapshot could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    /// Persisted bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Persistence contract for session state.
///
/// `load` returning `Ok(None)` means "no persisted state": a fresh session
/// id, or an expired entry. A load failure at connect time is treated the
/// same way by the session protocol, never as fatal.
pub trait SessionStore: Send + Sync {
    /// Persist the snapshot for a session identifier.
    fn save(&self, id: &str, state: StateSnapshot) -> Result<(), StoreError>;

    /// Retrieve the snapshot for a session identifier.
    fn load(&self, id: &str) -> Result<Option<StateSnapshot>, StoreError>;
}

/// In-memory session store. State does not survive process restarts.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StateSnapshot>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, id: &str, state: StateSnapshot) -> Result<(), StoreError> {
        self.entries.insert(id.to_owned(), state);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<StateSnapshot>, StoreError> {
        Ok(self.entries.get(id).map(|entry| entry.value().clone()))
    }
}

/// File-backed session store: one MessagePack file per session id.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Resolve the file for a session id.
    ///
    /// Session identifiers arrive from clients on reconnect, so anything
    /// outside `[A-Za-z0-9_-]` never reaches the filesystem; such ids are
    /// treated as having no persisted state.
    fn entry_path(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| self.dir.join(format!("{id}.bin")))
    }
}

impl SessionStore for FileStore {
    fn save(&self, id: &str, state: StateSnapshot) -> Result<(), StoreError> {
        let Some(path) = self.entry_path(id) else {
            tracing::warn!(session = %id, "refusing to persist unsafe session id");
            return Ok(());
        };
        let bytes = rmp_serde::to_vec(&state)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<StateSnapshot>, StoreError> {
        let Some(path) = self.entry_path(id) else {
            return Ok(None);
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn snapshot(key: &str, value: impl Into<Value>) -> StateSnapshot {
        let mut state = StateSnapshot::new();
        state.insert(key.to_string(), value.into());
        state
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        store.save("s1", snapshot("count", 5)).expect("save");

        let loaded = store.load("s1").expect("load").expect("present");
        assert_eq!(loaded.get("count"), Some(&Value::from(5)));
        assert!(store.load("s2").expect("load").is_none());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path()).expect("store");

        store.save("s1", snapshot("name", "ada")).expect("save");
        let loaded = store.load("s1").expect("load").expect("present");
        assert_eq!(loaded.get("name"), Some(&Value::from("ada")));
    }

    #[test]
    fn file_store_missing_id_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path()).expect("store");
        assert!(store.load("never-seen").expect("load").is_none());
    }

    #[test]
    fn file_store_rejects_unsafe_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path()).expect("store");

        store
            .save("../escape", snapshot("x", 1))
            .expect("save is a no-op");
        assert!(store.load("../escape").expect("load").is_none());
        assert!(store.load("").expect("load").is_none());
    }
}
