//! # VitaCart Session - Orchestration Layer
//!
//! One `CartSession` per shopper; drives the full command cycle.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       vitacart-session                                  │
//! │                                                                         │
//! │  Frontend / API handler                                                │
//! │       │ commands (JSON)                                                │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  CartSession<S: SnapshotStore>                                   │  │
//! │  │                                                                  │  │
//! │  │  issue_command(cmd)                                              │  │
//! │  │    ├── vitacart_core::apply(&state, cmd, ...)   (pure)          │  │
//! │  │    ├── swap in new state + summary              (atomic)        │  │
//! │  │    └── store.save(key, json)                    (best-effort)   │  │
//! │  │                                                                  │  │
//! │  │  add_product(lookup, ...)   ← ProductLookup port                │  │
//! │  │  checkout(gateway)          ← CheckoutGateway port              │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError { code, message }  ← what the frontend sees on failure       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod session;

pub use catalog::{ProductLookup, StaticCatalog};
pub use checkout::{CheckoutError, CheckoutGateway, CheckoutOrder, CheckoutReceipt};
pub use error::{ApiError, ErrorCode};
pub use session::CartSession;
