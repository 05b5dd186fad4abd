//! # vitacart-core: Pure Business Logic for VitaCart
//!
//! This crate is the **heart** of the VitaCart pricing subsystem. It contains
//! the cart state machine and the pricing/promotion engine as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VitaCart Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Platform Frontends (TypeScript)                    │   │
//! │  │    Catalog UI ──► Cart UI ──► Checkout UI                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  vitacart-session                               │   │
//! │  │    issue_command, summary, can_checkout, checkout handoff       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ vitacart-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌─────────┐ ┌───────┐ │   │
//! │  │   │  money  │ │  types  │ │ promotion │ │ pricing │ │command│ │   │
//! │  │   │  Money  │ │LineItem │ │  Catalog  │ │ Summary │ │ apply │ │   │
//! │  │   │  Rate   │ │CartState│ │ Promotion │ │ Config  │ │       │ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └─────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  vitacart-store (Persistence)                   │   │
//! │  │           SQLite snapshot blobs via SnapshotStore port          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and rate types with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (LineItem, ProductSnapshot, shipping tiers, etc.)
//! - [`cart`] - The cart state owned by a session
//! - [`promotion`] - Promotion definitions, catalog, eligibility
//! - [`pricing`] - The summary calculator (from-scratch recompute, every time)
//! - [`command`] - The command union and the pure transition function
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Supplied Time**: "now" is always an argument; nothing reads the wall clock
//! 5. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod command;
pub mod error;
pub mod money;
pub mod pricing;
pub mod promotion;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vitacart_core::Money` instead of
// `use vitacart_core::money::Money`

pub use cart::CartState;
pub use command::{apply, CartCommand, ItemPatch, Transition};
pub use error::{CatalogError, CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{calculate_summary, CartSummary, PricingConfig};
pub use promotion::{Discount, Promotion, PromotionCatalog, PromotionKind, PromotionScope};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum unique line items allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable order sizes.
/// Can be made configurable per-tenant in future versions.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10),
/// which matters more than usual when the products are medications.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Number of recently-added product ids retained in the cart history
///
/// Used by the storefront to surface "recently added" suggestions.
/// Oldest entries are evicted once the cap is reached.
pub const RECENT_HISTORY_LIMIT: usize = 10;
