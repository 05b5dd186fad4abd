//! # Store Error Types
//!
//! Error types for snapshot persistence.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  vitacart-session decides:                                             │
//! │    • on save  → log a warning, keep serving (writes are best-effort)   │
//! │    • on load  → fall back to an empty cart                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Snapshot persistence errors.
///
/// These wrap sqlx errors and provide categorization. Callers treat them
/// as degradations, not failures: a broken store never blocks the cart.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to StoreError.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
