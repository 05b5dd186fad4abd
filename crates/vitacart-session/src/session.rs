//! # Cart Session
//!
//! Owns the live cart for one shopper and serializes its mutations.
//!
//! ## Command Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CartSession Command Cycle                           │
//! │                                                                         │
//! │  issue_command(cmd)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  vitacart_core::apply(&state, cmd, catalog, config, now)                │
//! │       │                                                                 │
//! │       ├── Err(e) ──► return ApiError, session state UNTOUCHED           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  swap in Transition { state, summary }   ← the only mutation point      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.save(key, json)  ← best-effort: failure is logged, never         │
//! │       │                   surfaced; the in-memory cart stays correct    │
//! │       ▼                                                                 │
//! │  return the fresh CartSummary                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restore Semantics
//! A missing snapshot, a store error, and a corrupt blob all restore to the
//! same place: an empty cart. Persistence is an amenity, never a gate.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use vitacart_core::{
    apply, CartCommand, CartState, CartSummary, LineItem, PricingConfig, PromotionCatalog,
};
use vitacart_store::SnapshotStore;

use crate::catalog::ProductLookup;
use crate::checkout::{CheckoutGateway, CheckoutOrder, CheckoutReceipt};
use crate::error::ApiError;

/// One shopper's cart session.
///
/// Commands are processed one at a time through `&mut self`; there is no
/// interior mutability and no observable intermediate state.
pub struct CartSession<S: SnapshotStore> {
    /// Key under which snapshots are saved.
    session_key: String,

    /// The authoritative cart state.
    state: CartState,

    /// Summary matching `state`, recomputed on every transition.
    summary: CartSummary,

    /// Active promotion catalog (validated at load).
    catalog: PromotionCatalog,

    /// Pricing knobs (tax rate, shipping rates, thresholds).
    config: PricingConfig,

    /// Snapshot persistence.
    store: S,
}

impl<S: SnapshotStore> CartSession<S> {
    /// Restores a session from the store, falling back to an empty cart.
    ///
    /// ## Fallback Rules
    /// - No snapshot for the key → empty cart (first visit)
    /// - Store read fails → empty cart, warning logged
    /// - Snapshot doesn't parse → empty cart, warning logged
    ///
    /// Restoring never fails: the shopper always gets a working cart.
    pub async fn restore(
        session_key: impl Into<String>,
        store: S,
        catalog: PromotionCatalog,
        config: PricingConfig,
    ) -> Self {
        let session_key = session_key.into();

        let state = match store.load(&session_key).await {
            Ok(Some(payload)) => match serde_json::from_str::<CartState>(&payload) {
                Ok(state) => {
                    info!(
                        session_key = %session_key,
                        items = state.item_count(),
                        "Restored cart snapshot"
                    );
                    state
                }
                Err(e) => {
                    warn!(
                        session_key = %session_key,
                        error = %e,
                        "Cart snapshot is corrupt, starting empty"
                    );
                    CartState::new()
                }
            },
            Ok(None) => {
                debug!(session_key = %session_key, "No cart snapshot, starting empty");
                CartState::new()
            }
            Err(e) => {
                warn!(
                    session_key = %session_key,
                    error = %e,
                    "Snapshot load failed, starting empty"
                );
                CartState::new()
            }
        };

        let summary = vitacart_core::calculate_summary(
            &state.items,
            &catalog,
            &state.applied_codes,
            &config,
            Utc::now(),
        );

        CartSession {
            session_key,
            state,
            summary,
            catalog,
            config,
            store,
        }
    }

    /// Applies one command at the current instant.
    pub async fn issue_command(&mut self, command: CartCommand) -> Result<CartSummary, ApiError> {
        self.issue_command_at(command, Utc::now()).await
    }

    /// Applies one command at an explicit instant (used to pin promotion
    /// expiry in tests and replays).
    ///
    /// On error the session is untouched; on success the state and summary
    /// are swapped atomically and a snapshot write is attempted.
    pub async fn issue_command_at(
        &mut self,
        command: CartCommand,
        now: DateTime<Utc>,
    ) -> Result<CartSummary, ApiError> {
        debug!(session_key = %self.session_key, command = ?command, "Issuing cart command");

        let transition = apply(&self.state, command, &self.catalog, &self.config, now)?;

        self.state = transition.state;
        self.summary = transition.summary;

        self.persist().await;

        Ok(self.summary.clone())
    }

    /// Looks up a product and adds it to the cart.
    ///
    /// The lookup happens exactly once; the line item freezes the returned
    /// snapshot. Unknown products are rejected before any mutation.
    pub async fn add_product<L: ProductLookup>(
        &mut self,
        lookup: &L,
        product_id: &str,
        variant: Option<&str>,
        quantity: i64,
    ) -> Result<CartSummary, ApiError> {
        let snapshot = lookup
            .snapshot(product_id, variant)
            .await
            .ok_or_else(|| ApiError::not_found("Product", product_id))?;

        self.issue_command(CartCommand::AddItem { snapshot, quantity })
            .await
    }

    /// Hands the cart to the order pipeline.
    ///
    /// ## Preconditions
    /// The cart must be non-empty and every prescription line must carry
    /// both a prescriber and a pharmacy reference.
    ///
    /// ## On Success
    /// Earned loyalty points are credited to the balance and the cart is
    /// emptied (the balance survives, as with `CLEAR_CART`).
    ///
    /// ## On Failure
    /// The cart is untouched and the shopper can fix and retry.
    pub async fn checkout<G: CheckoutGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<CheckoutReceipt, ApiError> {
        if self.state.is_empty() {
            return Err(ApiError::checkout("Cart is empty"));
        }
        if !self.state.can_checkout() {
            return Err(ApiError::checkout(
                "Prescription items need a prescriber and a pharmacy before checkout",
            ));
        }

        let order = CheckoutOrder {
            session_key: self.session_key.clone(),
            items: self.state.items.clone(),
            summary: self.summary.clone(),
        };

        let receipt = gateway.submit(order).await?;

        info!(
            session_key = %self.session_key,
            order_id = %receipt.order_id,
            points_earned = self.summary.loyalty_points_earned,
            "Checkout complete"
        );

        self.state.loyalty_points += self.summary.loyalty_points_earned;
        let points = self.state.loyalty_points;
        self.issue_command(CartCommand::ClearCart).await?;
        debug_assert_eq!(self.state.loyalty_points, points);

        Ok(receipt)
    }

    /// Serializes the state and writes it to the store.
    ///
    /// Failures are logged and swallowed: a dead disk must never block the
    /// in-memory cart, and the next successful write self-heals.
    async fn persist(&self) {
        let payload = match serde_json::to_string(&self.state) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(session_key = %self.session_key, error = %e, "Cart state failed to serialize");
                return;
            }
        };

        if let Err(e) = self.store.save(&self.session_key, &payload).await {
            warn!(
                session_key = %self.session_key,
                error = %e,
                "Snapshot save failed, continuing with in-memory cart"
            );
        }
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    /// The summary matching the current state.
    pub fn summary(&self) -> &CartSummary {
        &self.summary
    }

    /// Number of distinct lines in the cart.
    pub fn item_count(&self) -> usize {
        self.state.item_count()
    }

    /// Finds a line by its id.
    pub fn item_by_id(&self, item_id: &str) -> Option<&LineItem> {
        self.state.item_by_id(item_id)
    }

    /// Whether checkout preconditions hold.
    pub fn can_checkout(&self) -> bool {
        self.state.can_checkout()
    }

    /// The current cart state (read-only).
    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Current loyalty point balance.
    pub fn loyalty_points(&self) -> i64 {
        self.state.loyalty_points
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vitacart_core::{ProductSnapshot, ShippingMethod};
    use vitacart_store::{MemorySnapshotStore, StoreError, StoreResult};

    use crate::catalog::StaticCatalog;
    use crate::checkout::CheckoutError;
    use crate::error::ErrorCode;

    /// Routes tracing output through the test harness so the fallback and
    /// swallow paths show their warnings under `--nocapture`. Safe to call
    /// from every test; only the first call installs a subscriber.
    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn snap(product_id: &str, price_cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id: product_id.to_string(),
            variant: None,
            name: format!("Product {}", product_id),
            brand: None,
            category: None,
            unit_price_cents: price_cents,
            prescription_required: false,
            insurance: None,
            recommendation_id: None,
        }
    }

    async fn session(store: MemorySnapshotStore) -> CartSession<MemorySnapshotStore> {
        CartSession::restore(
            "sess-1",
            store,
            PromotionCatalog::empty(),
            PricingConfig::default(),
        )
        .await
    }

    /// Store whose saves always fail - for verifying the swallow rule.
    #[derive(Default)]
    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        async fn save(&self, _key: &str, _payload: &str) -> StoreResult<()> {
            Err(StoreError::QueryFailed("disk on fire".to_string()))
        }

        async fn load(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::QueryFailed("disk on fire".to_string()))
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::QueryFailed("disk on fire".to_string()))
        }
    }

    /// Gateway that records submitted orders and answers with a fixed id.
    #[derive(Default)]
    struct RecordingGateway {
        orders: Mutex<Vec<CheckoutOrder>>,
        reject: bool,
    }

    impl CheckoutGateway for RecordingGateway {
        async fn submit(&self, order: CheckoutOrder) -> Result<CheckoutReceipt, CheckoutError> {
            if self.reject {
                return Err(CheckoutError::Rejected("card declined".to_string()));
            }
            self.orders.lock().unwrap().push(order);
            Ok(CheckoutReceipt {
                order_id: "ord-1".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_commands_persist_snapshots() {
        let mut session = session(MemorySnapshotStore::new()).await;

        session
            .issue_command(CartCommand::AddItem {
                snapshot: snap("p1", 2999),
                quantity: 2,
            })
            .await
            .unwrap();

        let payload = session.store.load("sess-1").await.unwrap().unwrap();
        let saved: CartState = serde_json::from_str(&payload).unwrap();
        assert_eq!(saved.total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_restore_roundtrip() {
        let store = MemorySnapshotStore::new();
        {
            let mut session = CartSession::restore(
                "sess-1",
                &store,
                PromotionCatalog::empty(),
                PricingConfig::default(),
            )
            .await;
            session
                .issue_command(CartCommand::AddItem {
                    snapshot: snap("p1", 2999),
                    quantity: 2,
                })
                .await
                .unwrap();
        }

        let restored = CartSession::restore(
            "sess-1",
            &store,
            PromotionCatalog::empty(),
            PricingConfig::default(),
        )
        .await;

        assert_eq!(restored.item_count(), 1);
        assert_eq!(restored.summary().subtotal_cents, 5998);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_restores_empty() {
        init_logging();
        let store = MemorySnapshotStore::new();
        store.save("sess-1", "{not json").await.unwrap();

        let session = CartSession::restore(
            "sess-1",
            &store,
            PromotionCatalog::empty(),
            PricingConfig::default(),
        )
        .await;

        assert_eq!(session.item_count(), 0);
        assert_eq!(session.summary().final_total_cents, 0);
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        init_logging();
        let mut session = CartSession::restore(
            "sess-1",
            BrokenStore,
            PromotionCatalog::empty(),
            PricingConfig::default(),
        )
        .await;

        // Load failed → empty cart; save fails → command still succeeds
        let summary = session
            .issue_command(CartCommand::AddItem {
                snapshot: snap("p1", 2999),
                quantity: 1,
            })
            .await
            .unwrap();

        assert_eq!(summary.subtotal_cents, 2999);
        assert_eq!(session.item_count(), 1);
    }

    #[tokio::test]
    async fn test_add_product_via_lookup() {
        let catalog = StaticCatalog::new([snap("p1", 2999)]);
        let mut session = session(MemorySnapshotStore::new()).await;

        let summary = session.add_product(&catalog, "p1", None, 2).await.unwrap();
        assert_eq!(summary.subtotal_cents, 5998);

        let err = session
            .add_product(&catalog, "ghost", None, 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(session.item_count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_requires_prescription_references() {
        let mut session = session(MemorySnapshotStore::new()).await;

        let mut rx = snap("rx1", 5000);
        rx.prescription_required = true;
        session
            .issue_command(CartCommand::AddItem {
                snapshot: rx,
                quantity: 1,
            })
            .await
            .unwrap();
        assert!(!session.can_checkout());

        let gateway = RecordingGateway::default();
        let err = session.checkout(&gateway).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckoutError);
        assert_eq!(session.item_count(), 1);

        // Fill in the references and retry
        let item_id = session.state().items[0].id.clone();
        session
            .issue_command(CartCommand::UpdateItem {
                item_id,
                patch: vitacart_core::ItemPatch {
                    prescriber_id: Some("dr-1".to_string()),
                    pharmacy_id: Some("ph-1".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert!(session.can_checkout());
        session.checkout(&gateway).await.unwrap();
        assert_eq!(gateway.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_credits_loyalty_and_clears() {
        let mut session = session(MemorySnapshotStore::new()).await;

        // $150.00 subtotal + 8% tax + $5.99 shipping... subtotal is above the
        // free-shipping threshold, so standard ships free: total $162.00
        session
            .issue_command(CartCommand::AddItem {
                snapshot: snap("p1", 15000),
                quantity: 1,
            })
            .await
            .unwrap();
        let expected_points = session.summary().loyalty_points_earned;
        assert_eq!(expected_points, 162);

        let gateway = RecordingGateway::default();
        let receipt = session.checkout(&gateway).await.unwrap();

        assert_eq!(receipt.order_id, "ord-1");
        assert_eq!(session.item_count(), 0);
        assert_eq!(session.loyalty_points(), expected_points);
    }

    #[tokio::test]
    async fn test_checkout_rejection_keeps_cart() {
        let mut session = session(MemorySnapshotStore::new()).await;
        session
            .issue_command(CartCommand::AddItem {
                snapshot: snap("p1", 2999),
                quantity: 1,
            })
            .await
            .unwrap();

        let gateway = RecordingGateway {
            reject: true,
            ..Default::default()
        };
        let err = session.checkout(&gateway).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CheckoutError);
        assert_eq!(session.item_count(), 1);
        assert_eq!(session.loyalty_points(), 0);
    }

    #[tokio::test]
    async fn test_failed_command_leaves_session_untouched() {
        let mut session = session(MemorySnapshotStore::new()).await;
        session
            .issue_command(CartCommand::AddItem {
                snapshot: snap("p1", 2999),
                quantity: 1,
            })
            .await
            .unwrap();
        let before = session.summary().clone();

        let err = session
            .issue_command(CartCommand::ApplyPromotion {
                code: "NOPE".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PromotionError);
        assert_eq!(session.summary(), &before);
        assert!(session.state().applied_codes.is_empty());
    }

    #[tokio::test]
    async fn test_shipping_method_flows_to_summary() {
        let mut session = session(MemorySnapshotStore::new()).await;
        session
            .issue_command(CartCommand::AddItem {
                snapshot: snap("p1", 2999),
                quantity: 1,
            })
            .await
            .unwrap();
        let item_id = session.state().items[0].id.clone();

        let summary = session
            .issue_command(CartCommand::SetShippingMethod {
                item_id,
                method: ShippingMethod::Overnight,
            })
            .await
            .unwrap();

        assert_eq!(summary.shipping_cents, 2499);
        assert_eq!(summary.estimated_delivery, "Tomorrow");
    }
}
