//! # Error Types
//!
//! Domain-specific error types for vitacart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitacart-core errors (this file)                                      │
//! │  ├── CoreError        - Command/domain errors                          │
//! │  ├── CatalogError     - Promotion configuration errors (fatal at load) │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitacart-store errors (separate crate)                                │
//! │  └── StoreError       - Persistence failures (logged, never fatal)     │
//! │                                                                         │
//! │  vitacart-session errors                                               │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, id, limits)
//! 3. Errors are enum variants, never String
//! 4. Unknown item ids are NOT errors - commands targeting them are no-ops

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart command and domain errors.
///
/// These represent business rule violations. Note the deliberate asymmetry:
/// a command aimed at an item id that no longer exists is a silent no-op
/// (the UI may race against an already-removed line), while an unknown or
/// expired promotion code is an explicit rejection.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart has exceeded maximum allowed unique line items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A promotion code cannot be applied.
    ///
    /// ## When This Occurs
    /// - The code does not exist in the promotion catalog
    /// - The promotion has expired
    ///
    /// State is never mutated when this is returned: the applied-codes set
    /// is exactly what it was before the command.
    #[error("Promotion code '{code}' is not applicable: {reason}")]
    PromotionNotApplicable { code: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Catalog Error
// =============================================================================

/// Promotion catalog configuration errors.
///
/// These are **fatal at catalog-load time**. A malformed promotion must
/// never survive into a recompute path where it could silently distort a
/// checkout total, so the catalog refuses to construct at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog JSON could not be parsed.
    #[error("Promotion catalog is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Two promotions share the same id.
    #[error("Duplicate promotion id: {0}")]
    DuplicateId(String),

    /// Two promotions share the same code.
    #[error("Duplicate promotion code: {0}")]
    DuplicateCode(String),

    /// A discount value is out of range (zero/negative amount, rate above 100%).
    #[error("Promotion '{id}' has an invalid discount: {reason}")]
    InvalidDiscount { id: String, reason: String },

    /// Minimum purchase must not be negative.
    #[error("Promotion '{id}' has a negative minimum purchase")]
    NegativeMinPurchase { id: String },

    /// A promotion that is not auto-applied must carry a code, otherwise
    /// nothing can ever activate it.
    #[error("Promotion '{id}' is not auto-apply and has no code")]
    Unreachable { id: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when command input doesn't meet requirements, before any
/// state transition runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
