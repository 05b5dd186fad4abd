//! # VitaCart Store - Snapshot Persistence
//!
//! Cart snapshot persistence behind one small port.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        vitacart-store                                   │
//! │                                                                         │
//! │  vitacart-session                                                      │
//! │       │                                                                 │
//! │       │  save(key, json) / load(key) / delete(key)                     │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐                                              │
//! │  │   SnapshotStore      │  ← trait (the port)                          │
//! │  └──────────┬───────────┘                                              │
//! │             │                                                           │
//! │    ┌────────┴─────────┐                                                │
//! │    ▼                  ▼                                                 │
//! │  SqliteSnapshotStore  MemorySnapshotStore                              │
//! │  (WAL, pooled,        (HashMap, tests and                              │
//! │   migrations)          ephemeral sessions)                             │
//! │                                                                         │
//! │  Payloads are OPAQUE JSON strings. The store never parses cart state:  │
//! │  what the cart shape means is vitacart-core's business.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemorySnapshotStore;
pub use sqlite::{SqliteSnapshotStore, StoreConfig};

/// Port for cart snapshot persistence.
///
/// Implementations store whole-cart JSON payloads keyed by session. The
/// payload is opaque: the store neither parses nor validates it.
///
/// ## Contract
/// - `save` overwrites any previous payload for the key
/// - `load` returns `Ok(None)` for an unknown key (absence is not an error)
/// - `delete` is idempotent
#[allow(async_fn_in_trait)]
pub trait SnapshotStore: Send + Sync {
    /// Writes (or overwrites) the payload for a session key.
    async fn save(&self, session_key: &str, payload: &str) -> StoreResult<()>;

    /// Reads the payload for a session key, if one exists.
    async fn load(&self, session_key: &str) -> StoreResult<Option<String>>;

    /// Removes the payload for a session key, if one exists.
    async fn delete(&self, session_key: &str) -> StoreResult<()>;
}

/// A shared reference to a store is itself a store, so one backing store
/// can serve many sessions.
impl<S: SnapshotStore> SnapshotStore for &S {
    async fn save(&self, session_key: &str, payload: &str) -> StoreResult<()> {
        (**self).save(session_key, payload).await
    }

    async fn load(&self, session_key: &str) -> StoreResult<Option<String>> {
        (**self).load(session_key).await
    }

    async fn delete(&self, session_key: &str) -> StoreResult<()> {
        (**self).delete(session_key).await
    }
}
