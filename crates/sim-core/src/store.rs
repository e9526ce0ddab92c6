//! Durable key-value seam.
//!
//! The SIM registry persists through this trait rather than a concrete
//! preference store, so embedders can back it with whatever the platform
//! offers and tests can run against [`MemoryStore`].

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;

/// String key-value storage for advisory state.
///
/// Writes are not transactional with in-memory mutation; a crash between
/// discrete updates may lose the tail of a save sequence, which is
/// acceptable for usage tracking.
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store used by tests and embedders without a platform store.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
