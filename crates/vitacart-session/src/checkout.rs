//! # Checkout Handoff
//!
//! The boundary where the cart stops and the order pipeline starts. The
//! session hands a complete priced order to a `CheckoutGateway`; payment,
//! fulfillment, and prescription verification live on the other side.

use thiserror::Error;
use vitacart_core::{CartSummary, LineItem};

/// Everything the order pipeline needs: the frozen lines and the final
/// priced summary they were accepted under.
#[derive(Debug, Clone)]
pub struct CheckoutOrder {
    /// Session the order originated from.
    pub session_key: String,

    /// The cart lines, frozen as priced.
    pub items: Vec<LineItem>,

    /// The summary the shopper confirmed.
    pub summary: CartSummary,
}

/// Acknowledgement from the order pipeline.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    /// Order identifier assigned by the pipeline.
    pub order_id: String,
}

/// Checkout gateway failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The pipeline refused the order (payment declined, rx hold, ...).
    #[error("Checkout rejected: {0}")]
    Rejected(String),

    /// The pipeline could not be reached.
    #[error("Checkout gateway unavailable: {0}")]
    Unavailable(String),
}

/// Port for submitting a finished cart to the order pipeline.
///
/// On `Ok` the session considers the order placed: it credits earned
/// loyalty points and empties the cart. On `Err` the cart is untouched and
/// the shopper can retry.
#[allow(async_fn_in_trait)]
pub trait CheckoutGateway {
    /// Submits the order, returning the pipeline's receipt.
    async fn submit(&self, order: CheckoutOrder) -> Result<CheckoutReceipt, CheckoutError>;
}
