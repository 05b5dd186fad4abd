//! # In-Memory Snapshot Store
//!
//! HashMap-backed `SnapshotStore` for tests and ephemeral (guest) sessions.
//! Same contract as the SQLite store, none of the durability.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreResult;
use crate::SnapshotStore;

/// Volatile snapshot store. Contents vanish when dropped.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("snapshot map poisoned").len()
    }

    /// Whether the store holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, session_key: &str, payload: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .expect("snapshot map poisoned")
            .insert(session_key.to_string(), payload.to_string());
        Ok(())
    }

    async fn load(&self, session_key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("snapshot map poisoned")
            .get(session_key)
            .cloned())
    }

    async fn delete(&self, session_key: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .expect("snapshot map poisoned")
            .remove(session_key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
