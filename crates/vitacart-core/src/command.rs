//! # Command Processor (Cart State Machine)
//!
//! The tagged-union command type and the pure transition function.
//!
//! ## Transition Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One Command, One Transition                            │
//! │                                                                         │
//! │  caller ──► apply(&state, command, catalog, config, now)               │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │        ┌───────────────────┐                                           │
//! │        │ clone the state   │  mutations happen on the copy, so an      │
//! │        │ mutate the copy   │  error leaves the caller's state exactly  │
//! │        │ recompute summary │  as it was - no observable intermediate   │
//! │        └─────────┬─────────┘                                           │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │        Ok(Transition { state, summary })  ──► caller swaps state in    │
//! │        Err(CoreError)                      ──► caller keeps old state   │
//! │                                                                         │
//! │  The summary is recomputed from scratch on EVERY transition - it is    │
//! │  never hand-patched incrementally.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Silent No-Ops
//! Commands that target an item id no longer in the cart succeed without
//! effect. The UI may legitimately race against an already-removed line,
//! and surfacing that race as an error would only produce noise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartState;
use crate::error::{CoreResult, ValidationError};
use crate::money::Rate;
use crate::pricing::{calculate_summary, CartSummary, PricingConfig};
use crate::promotion::PromotionCatalog;
use crate::types::{InsuranceCoverage, LineItem, ProductSnapshot, ShippingMethod, SubscriptionFrequency};

// =============================================================================
// Commands
// =============================================================================

/// Every mutation the cart supports, as one tagged union.
///
/// The serialized form uses SCREAMING_SNAKE_CASE tags (`ADD_ITEM`,
/// `APPLY_PROMOTION`, ...) matching the platform's command vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartCommand {
    /// Merge into an existing (product, variant) line or append a new one.
    AddItem {
        snapshot: ProductSnapshot,
        quantity: i64,
    },

    /// Drop a line. Idempotent no-op if the id is absent.
    RemoveItem { item_id: String },

    /// Set a line's quantity; `quantity <= 0` removes the line.
    UpdateQuantity { item_id: String, quantity: i64 },

    /// Shallow-merge a patch of optional fields into a line.
    UpdateItem { item_id: String, patch: ItemPatch },

    /// Add a promotion code to the applied set.
    ApplyPromotion { code: String },

    /// Remove a promotion code from the applied set. Idempotent.
    RemovePromotion { code: String },

    /// Assign a per-line shipping tier.
    SetShippingMethod {
        item_id: String,
        method: ShippingMethod,
    },

    /// Flip the subscription flag. Turning it on defaults the frequency to
    /// monthly and enables auto-refill; turning it off clears auto-refill
    /// AND resets the stored frequency, so re-enabling starts from the
    /// monthly default rather than a stale cadence.
    ToggleSubscription {
        item_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frequency: Option<SubscriptionFrequency>,
    },

    /// Flip the auto-refill flag.
    ToggleAutoRefill { item_id: String },

    /// Empty items, applied codes, and recent history. Loyalty points persist.
    ClearCart,
}

/// Optional fields shallow-merged into a line by `UPDATE_ITEM`.
///
/// `None` means "leave as is"; a quantity of zero or less removes the line,
/// mirroring `UPDATE_QUANTITY`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<ShippingMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescriber_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refill: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<SubscriptionFrequency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<InsuranceCoverage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,

    /// Bundle discount in basis points; must be at most 10000 (100%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_discount_bps: Option<u32>,
}

// =============================================================================
// Transition
// =============================================================================

/// The result of one successful command: the complete new state and the
/// freshly recomputed summary.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: CartState,
    pub summary: CartSummary,
}

// =============================================================================
// Transition Function
// =============================================================================

/// Applies exactly one command, producing a complete new state.
///
/// Pure: the input state is never mutated. On error the caller's state is
/// untouched by construction. Every successful transition carries a full
/// from-scratch summary.
pub fn apply(
    state: &CartState,
    command: CartCommand,
    catalog: &PromotionCatalog,
    config: &PricingConfig,
    now: DateTime<Utc>,
) -> CoreResult<Transition> {
    let mut next = state.clone();

    match command {
        CartCommand::AddItem { snapshot, quantity } => {
            if quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            let item = LineItem::from_snapshot(&snapshot, quantity, now);
            let product_id = item.product_id.clone();
            next.merge_or_append(item)?;
            next.record_recent(&product_id);
        }

        CartCommand::RemoveItem { item_id } => {
            next.remove_item(&item_id);
        }

        CartCommand::UpdateQuantity { item_id, quantity } => {
            next.set_quantity(&item_id, quantity)?;
        }

        CartCommand::UpdateItem { item_id, patch } => {
            apply_patch(&mut next, &item_id, patch)?;
        }

        CartCommand::ApplyPromotion { code } => {
            // Unknown/expired codes are rejected before any mutation.
            catalog.check_code(&code, now)?;
            next.apply_code(&code);
        }

        CartCommand::RemovePromotion { code } => {
            next.remove_code(&code);
        }

        CartCommand::SetShippingMethod { item_id, method } => {
            if let Some(item) = next.item_by_id_mut(&item_id) {
                item.shipping_method = method;
            }
        }

        CartCommand::ToggleSubscription { item_id, frequency } => {
            if let Some(item) = next.item_by_id_mut(&item_id) {
                if item.is_subscription {
                    item.is_subscription = false;
                    item.frequency = None;
                    item.auto_refill = false;
                } else {
                    item.is_subscription = true;
                    item.frequency = Some(frequency.unwrap_or_default());
                    item.auto_refill = true;
                }
            }
        }

        CartCommand::ToggleAutoRefill { item_id } => {
            if let Some(item) = next.item_by_id_mut(&item_id) {
                item.auto_refill = !item.auto_refill;
            }
        }

        CartCommand::ClearCart => {
            next.clear();
        }
    }

    let summary = calculate_summary(&next.items, catalog, &next.applied_codes, config, now);

    Ok(Transition {
        state: next,
        summary,
    })
}

/// Shallow-merges a patch into a line. Unknown ids are a silent no-op.
fn apply_patch(state: &mut CartState, item_id: &str, patch: ItemPatch) -> CoreResult<()> {
    // A rate above 100% would make the line total negative; reject before
    // any mutation.
    if let Some(bps) = patch.bundle_discount_bps {
        if bps > Rate::FULL_BPS {
            return Err(ValidationError::OutOfRange {
                field: "bundleDiscountBps".to_string(),
                min: 0,
                max: Rate::FULL_BPS as i64,
            }
            .into());
        }
    }

    // Quantity routes through the same removal rule as UPDATE_QUANTITY.
    if let Some(quantity) = patch.quantity {
        state.set_quantity(item_id, quantity)?;
        if quantity <= 0 {
            return Ok(());
        }
    }

    if let Some(item) = state.item_by_id_mut(item_id) {
        if let Some(method) = patch.shipping_method {
            item.shipping_method = method;
        }
        if let Some(prescriber) = patch.prescriber_id {
            item.prescriber_id = Some(prescriber);
        }
        if let Some(pharmacy) = patch.pharmacy_id {
            item.pharmacy_id = Some(pharmacy);
        }
        if let Some(auto_refill) = patch.auto_refill {
            item.auto_refill = auto_refill;
        }
        if let Some(frequency) = patch.frequency {
            item.frequency = Some(frequency);
        }
        if let Some(insurance) = patch.insurance {
            item.insurance = Some(insurance);
        }
        if let Some(bundle_id) = patch.bundle_id {
            item.bundle_id = Some(bundle_id);
        }
        if let Some(bps) = patch.bundle_discount_bps {
            item.bundle_discount_bps = bps;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
