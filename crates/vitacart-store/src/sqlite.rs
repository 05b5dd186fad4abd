//! # SQLite Snapshot Store
//!
//! Connection pool creation and the durable `SnapshotStore` implementation.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SQLite Snapshot Store                               │
//! │                                                                         │
//! │  Service Startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreConfig::new(path) ← Configure pool settings                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqliteSnapshotStore::new(config).await ← Create pool + migrations     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │  (max_connections)        │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │                           │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  save/load/delete against cart_snapshots (one row per session key)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block writers
//! - Better crash recovery

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::SnapshotStore;

// =============================================================================
// Configuration
// =============================================================================

/// Snapshot store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = StoreConfig::new("/path/to/vitacart.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl StoreConfig {
    /// Creates a new store configuration with the given path.
    ///
    /// The database file will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// SQLite Snapshot Store
// =============================================================================

/// Durable snapshot store backed by a pooled SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    /// Creates a new snapshot store.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing snapshot store"
        );

        // sqlite://path with mode=rwc creates the file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            // WAL mode: readers don't block writers
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: safe from corruption, may lose last txn on crash
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off for backwards compatibility
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Snapshot store pool created"
        );

        let store = SqliteSnapshotStore { pool };

        if config.run_migrations {
            store.run_migrations().await?;
        }

        Ok(store)
    }

    /// Runs database migrations.
    ///
    /// Automatically called by `new()` unless disabled in config.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running snapshot store migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// For diagnostics; prefer the `SnapshotStore` methods.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all store operations will fail.
    pub async fn close(&self) {
        info!("Closing snapshot store pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    async fn save(&self, session_key: &str, payload: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();

        debug!(session_key = %session_key, bytes = payload.len(), "Saving cart snapshot");

        sqlx::query(
            r#"
            INSERT INTO cart_snapshots (session_key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(session_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_key)
        .bind(payload)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, session_key: &str) -> StoreResult<Option<String>> {
        debug!(session_key = %session_key, "Loading cart snapshot");

        let payload: Option<String> = sqlx::query_scalar(
            r#"
            SELECT payload FROM cart_snapshots WHERE session_key = ?1
            "#,
        )
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload)
    }

    async fn delete(&self, session_key: &str) -> StoreResult<()> {
        debug!(session_key = %session_key, "Deleting cart snapshot");

        sqlx::query(
            r#"
            DELETE FROM cart_snapshots WHERE session_key = ?1
            "#,
        )
        .bind(session_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_health() {
        let store = SqliteSnapshotStore::new(StoreConfig::in_memory())
            .await
            .unwrap();
        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = StoreConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = SqliteSnapshotStore::new(StoreConfig::in_memory())
            .await
            .unwrap();

        assert_eq!(store.load("sess-1").await.unwrap(), None);

        store.save("sess-1", r#"{"items":[]}"#).await.unwrap();
        assert_eq!(
            store.load("sess-1").await.unwrap().as_deref(),
            Some(r#"{"items":[]}"#)
        );
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = SqliteSnapshotStore::new(StoreConfig::in_memory())
            .await
            .unwrap();

        store.save("sess-1", "v1").await.unwrap();
        store.save("sess-1", "v2").await.unwrap();

        assert_eq!(store.load("sess-1").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SqliteSnapshotStore::new(StoreConfig::in_memory())
            .await
            .unwrap();

        store.save("sess-1", "v1").await.unwrap();
        store.delete("sess-1").await.unwrap();
        store.delete("sess-1").await.unwrap();

        assert_eq!(store.load("sess-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let store = SqliteSnapshotStore::new(StoreConfig::in_memory())
            .await
            .unwrap();

        store.save("a", "payload-a").await.unwrap();
        store.save("b", "payload-b").await.unwrap();
        store.delete("a").await.unwrap();

        assert_eq!(store.load("a").await.unwrap(), None);
        assert_eq!(store.load("b").await.unwrap().as_deref(), Some("payload-b"));
    }
}
