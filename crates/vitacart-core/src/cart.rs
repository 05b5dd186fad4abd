//! # Cart State
//!
//! The full state of one shopping cart.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart State Ownership                               │
//! │                                                                         │
//! │  CartSession (vitacart-session)                                        │
//! │       │ owns exactly one                                                │
//! │       ▼                                                                 │
//! │  CartState ◄── the ONLY mutation path is the command processor          │
//! │   ├── items          (insertion order = promotion iteration order)     │
//! │   ├── applied_codes  (each code at most once)                          │
//! │   ├── recent history (bounded, newest first)                           │
//! │   └── loyalty points (survives CLEAR_CART)                             │
//! │                                                                         │
//! │  No ambient globals, no framework-managed state, no re-render hooks.   │
//! │  The state is an explicit value passed by reference into the pure      │
//! │  transition and pricing functions.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::LineItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, RECENT_HISTORY_LIMIT};

// =============================================================================
// Cart State
// =============================================================================

/// The complete state of one cart.
///
/// ## Invariants
/// - Line quantities are always >= 1 (dropping to zero removes the line)
/// - Lines are unique by (product_id, variant): adds merge, never duplicate
/// - `applied_codes` holds each code at most once, in application order
/// - `recent_product_ids` is capped at [`RECENT_HISTORY_LIMIT`], newest first
/// - `loyalty_points` survives `CLEAR_CART`
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Line items in insertion order.
    pub items: Vec<LineItem>,

    /// Applied promotion codes, each at most once.
    pub applied_codes: Vec<String>,

    /// Recently added product ids, newest first, bounded.
    pub recent_product_ids: Vec<String>,

    /// Loyalty point balance. Credited at checkout, never by recompute.
    pub loyalty_points: i64,
}

impl CartState {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        CartState::default()
    }

    /// Number of unique line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Checks if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up a line by its id.
    pub fn item_by_id(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Mutable lookup by line id. Internal to the transition path.
    pub(crate) fn item_by_id_mut(&mut self, item_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Merges a line into an existing (product, variant) match by summing
    /// quantities, or appends it as a new line.
    ///
    /// ## Returns
    /// - `Ok(())` on success
    /// - `Err(CoreError::QuantityTooLarge)` if a merge would exceed the cap
    /// - `Err(CoreError::CartTooLarge)` if appending would exceed the cap
    pub(crate) fn merge_or_append(&mut self, item: LineItem) -> CoreResult<()> {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.matches(&item.product_id, item.variant.as_deref()))
        {
            let merged = existing.quantity + item.quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = merged;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(item);
        Ok(())
    }

    /// Removes a line by id. Returns whether a line was removed.
    ///
    /// Absent ids are a no-op: removal is idempotent.
    pub(crate) fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }

    /// Sets a line's quantity. `quantity <= 0` removes the line; an unknown
    /// id is a silent no-op.
    pub(crate) fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_item(item_id);
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::Validation(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }));
        }

        if let Some(item) = self.item_by_id_mut(item_id) {
            item.quantity = quantity;
        }
        Ok(())
    }

    /// Adds a promotion code if not already present. Returns whether the
    /// applied set changed.
    pub(crate) fn apply_code(&mut self, code: &str) -> bool {
        if self.applied_codes.iter().any(|c| c == code) {
            return false;
        }
        self.applied_codes.push(code.to_string());
        true
    }

    /// Removes a promotion code if present. Idempotent.
    pub(crate) fn remove_code(&mut self, code: &str) {
        self.applied_codes.retain(|c| c != code);
    }

    /// Records a product id in the bounded recent-history list.
    pub(crate) fn record_recent(&mut self, product_id: &str) {
        self.recent_product_ids.retain(|p| p != product_id);
        self.recent_product_ids.insert(0, product_id.to_string());
        self.recent_product_ids.truncate(RECENT_HISTORY_LIMIT);
    }

    /// Empties items, applied codes, and recent history.
    ///
    /// Loyalty points are deliberately untouched: clearing a cart is not
    /// forfeiting a balance.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.applied_codes.clear();
        self.recent_product_ids.clear();
    }

    /// Whether this cart can proceed to checkout.
    ///
    /// True iff the cart is non-empty AND every prescription-required line
    /// has both a prescriber reference and a pharmacy reference attached.
    pub fn can_checkout(&self) -> bool {
        !self.is_empty() && self.items.iter().all(|i| i.prescription_satisfied())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::snapshot;
    use crate::types::LineItem;
    use chrono::Utc;

    fn line(product_id: &str, price_cents: i64, qty: i64) -> LineItem {
        LineItem::from_snapshot(&snapshot(product_id, price_cents), qty, Utc::now())
    }

    #[test]
    fn test_merge_same_product_variant() {
        let mut cart = CartState::new();
        cart.merge_or_append(line("p1", 999, 2)).unwrap();
        cart.merge_or_append(line("p1", 999, 3)).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_different_variants_do_not_merge() {
        let mut cart = CartState::new();
        let mut snap = snapshot("p1", 999);
        cart.merge_or_append(LineItem::from_snapshot(&snap, 1, Utc::now()))
            .unwrap();
        snap.variant = Some("500mg".to_string());
        cart.merge_or_append(LineItem::from_snapshot(&snap, 1, Utc::now()))
            .unwrap();

        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_merge_respects_quantity_cap() {
        let mut cart = CartState::new();
        cart.merge_or_append(line("p1", 999, 900)).unwrap();
        let err = cart.merge_or_append(line("p1", 999, 200)).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        // Original quantity untouched
        assert_eq!(cart.total_quantity(), 900);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = CartState::new();
        cart.merge_or_append(line("p1", 999, 1)).unwrap();
        let id = cart.items[0].id.clone();

        assert!(cart.remove_item(&id));
        assert!(!cart.remove_item(&id));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = CartState::new();
        cart.merge_or_append(line("p1", 999, 2)).unwrap();
        let id = cart.items[0].id.clone();

        cart.set_quantity(&id, 0).unwrap();
        assert!(cart.item_by_id(&id).is_none());
    }

    #[test]
    fn test_apply_code_once() {
        let mut cart = CartState::new();
        assert!(cart.apply_code("SAVE20"));
        assert!(!cart.apply_code("SAVE20"));
        assert_eq!(cart.applied_codes.len(), 1);

        cart.remove_code("SAVE20");
        cart.remove_code("SAVE20");
        assert!(cart.applied_codes.is_empty());
    }

    #[test]
    fn test_recent_history_bounded() {
        let mut cart = CartState::new();
        for i in 0..15 {
            cart.record_recent(&format!("p{}", i));
        }
        assert_eq!(cart.recent_product_ids.len(), RECENT_HISTORY_LIMIT);
        assert_eq!(cart.recent_product_ids[0], "p14");
    }

    #[test]
    fn test_clear_keeps_loyalty_points() {
        let mut cart = CartState::new();
        cart.merge_or_append(line("p1", 999, 1)).unwrap();
        cart.apply_code("SAVE20");
        cart.record_recent("p1");
        cart.loyalty_points = 120;

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.applied_codes.is_empty());
        assert!(cart.recent_product_ids.is_empty());
        assert_eq!(cart.loyalty_points, 120);
    }

    #[test]
    fn test_can_checkout_requires_rx_references() {
        let mut cart = CartState::new();
        assert!(!cart.can_checkout()); // empty

        let mut rx = line("rx1", 5000, 1);
        rx.prescription_required = true;
        cart.merge_or_append(rx).unwrap();
        assert!(!cart.can_checkout());

        let id = cart.items[0].id.clone();
        let item = cart.item_by_id_mut(&id).unwrap();
        item.prescriber_id = Some("dr-9".to_string());
        item.pharmacy_id = Some("ph-2".to_string());
        assert!(cart.can_checkout());
    }
}
