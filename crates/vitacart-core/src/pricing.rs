//! # Pricing Engine (Summary Calculator)
//!
//! Pure, deterministic `(items, catalog, applied codes) → summary`.
//!
//! ## Recompute From Scratch, Every Time
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Summary Pipeline                                    │
//! │                                                                         │
//! │  1. Line totals   round2(unit × qty × (1 − bundle%)) per line          │
//! │  2. Subtotal      Σ line totals (already rounded)                      │
//! │  3. Eligibility   auto/coded + unexpired + min purchase                │
//! │  4. Discounts     STACK every eligible promotion, catalog order        │
//! │  5. Shipping      one cart-level tier by escalation, charged once      │
//! │  6. Insurance     Σ per-line offsets + Σ per-line copays               │
//! │  7. Tax           (subtotal − discounts) × rate                        │
//! │                   after discounts, BEFORE shipping and insurance       │
//! │  8. Final         subtotal − discounts + shipping + tax               │
//! │                   − insurance + copays, clamped at 0                   │
//! │                                                                         │
//! │  The summary is NEVER patched incrementally. Hand-patching invites     │
//! │  drift between what the shopper saw and what the card is charged;     │
//! │  a full recompute from the same inputs cannot drift.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//! Identical inputs always produce byte-identical outputs. There is no
//! hidden state and no wall-clock dependence: expiry filtering uses the
//! supplied `now`, which makes it a pure function of its arguments too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};
use crate::promotion::{Discount, PromotionCatalog};
use crate::types::{LineItem, ShippingMethod};

// =============================================================================
// Pricing Configuration
// =============================================================================

/// Flat rates and thresholds the engine prices against.
///
/// ## Configuration Sources (Priority Order)
/// 1. Environment variables (`VITACART_*`)
/// 2. Defaults (this file)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Sales tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,

    /// Flat rate for standard shipping, below the free threshold.
    pub standard_shipping_cents: i64,

    /// Flat rate for express shipping.
    pub express_shipping_cents: i64,

    /// Flat rate for overnight shipping.
    pub overnight_shipping_cents: i64,

    /// Subtotal at which standard shipping becomes free.
    pub free_shipping_threshold_cents: i64,

    /// Cents of final total per loyalty point earned (100 = 1 point per dollar).
    pub loyalty_points_divisor_cents: i64,
}

impl Default for PricingConfig {
    /// Returns default pricing suitable for development.
    ///
    /// ## Default Values
    /// - Tax: 8%
    /// - Shipping: $5.99 standard / $12.99 express / $24.99 overnight
    /// - Free standard shipping at $50.00
    /// - 1 loyalty point per final-total dollar
    fn default() -> Self {
        PricingConfig {
            tax_rate_bps: 800,
            standard_shipping_cents: 599,
            express_shipping_cents: 1299,
            overnight_shipping_cents: 2499,
            free_shipping_threshold_cents: 5000,
            loyalty_points_divisor_cents: 100,
        }
    }
}

impl PricingConfig {
    /// Creates a PricingConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `VITACART_TAX_RATE_BPS`: Override tax rate in basis points
    /// - `VITACART_FREE_SHIPPING_CENTS`: Override the free-shipping threshold
    pub fn from_env() -> Self {
        let mut config = PricingConfig::default();

        if let Ok(bps) = std::env::var("VITACART_TAX_RATE_BPS") {
            if let Ok(bps) = bps.parse::<u32>() {
                config.tax_rate_bps = bps;
            }
        }

        if let Ok(cents) = std::env::var("VITACART_FREE_SHIPPING_CENTS") {
            if let Ok(cents) = cents.parse::<i64>() {
                config.free_shipping_threshold_cents = cents;
            }
        }

        config
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> Rate {
        Rate::from_bps(self.tax_rate_bps)
    }

    /// Flat charge for a resolved cart-level tier at a given subtotal.
    ///
    /// Standard collapses to free once the subtotal crosses the threshold;
    /// the more expensive tiers never do.
    pub fn shipping_charge(&self, tier: ShippingMethod, subtotal: Money) -> Money {
        match tier {
            ShippingMethod::Overnight => Money::from_cents(self.overnight_shipping_cents),
            ShippingMethod::Express => Money::from_cents(self.express_shipping_cents),
            ShippingMethod::Standard => {
                if subtotal.cents() >= self.free_shipping_threshold_cents {
                    Money::zero()
                } else {
                    Money::from_cents(self.standard_shipping_cents)
                }
            }
            ShippingMethod::Free => Money::zero(),
        }
    }
}

// =============================================================================
// Cart Summary
// =============================================================================

/// The fully derived monetary summary of a cart.
///
/// Never stored: recomputed from scratch on every read, because this value
/// becomes a real charge amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Unique line items.
    pub item_count: usize,

    /// Total quantity across all lines.
    pub total_quantity: i64,

    /// Σ per-line totals, each rounded at the line level.
    pub subtotal_cents: i64,

    /// Stacked discounts from all eligible promotions.
    pub discount_cents: i64,

    /// Single cart-level shipping charge.
    pub shipping_cents: i64,

    /// Tax on (subtotal − discounts).
    pub tax_cents: i64,

    /// Σ per-line insurance offsets.
    pub insurance_cents: i64,

    /// Σ per-line copays.
    pub copay_cents: i64,

    /// subtotal − discounts + shipping + tax − insurance + copays, floor 0.
    pub final_total_cents: i64,

    /// discounts + insurance, reported to the user as "amount saved".
    pub total_savings_cents: i64,

    /// floor(final total / points divisor).
    pub loyalty_points_earned: i64,

    /// Customer-facing delivery estimate from the resolved shipping tier.
    pub estimated_delivery: String,
}

impl CartSummary {
    /// The summary of an empty cart: all zeros.
    pub fn empty() -> Self {
        CartSummary {
            item_count: 0,
            total_quantity: 0,
            subtotal_cents: 0,
            discount_cents: 0,
            shipping_cents: 0,
            tax_cents: 0,
            insurance_cents: 0,
            copay_cents: 0,
            final_total_cents: 0,
            total_savings_cents: 0,
            loyalty_points_earned: 0,
            estimated_delivery: ShippingMethod::Standard.delivery_estimate().to_string(),
        }
    }
}

// =============================================================================
// Summary Calculation
// =============================================================================

/// Computes the full cart summary from scratch.
///
/// Pure and deterministic: no hidden state, no wall-clock reads. `now` only
/// feeds promotion expiry filtering.
///
/// ## Ordering Is Load-Bearing
/// Tax is computed on `(subtotal − discounts)` strictly BEFORE shipping is
/// added and insurance is subtracted. Reordering these steps changes real
/// charge amounts.
pub fn calculate_summary(
    items: &[LineItem],
    catalog: &PromotionCatalog,
    applied_codes: &[String],
    config: &PricingConfig,
    now: DateTime<Utc>,
) -> CartSummary {
    // Step 1-2: line-level rounding, then sum
    let subtotal: Money = items
        .iter()
        .map(|i| i.line_total())
        .fold(Money::zero(), |acc, t| acc + t);

    // Step 3-4: stack every eligible promotion in catalog order
    let mut discounts = Money::zero();
    let mut free_shipping = false;
    for promo in catalog.eligible(subtotal, applied_codes, now) {
        match &promo.discount {
            Discount::Percentage {
                rate_bps,
                max_discount_cents,
            } => {
                let raw = subtotal.apply_rate(Rate::from_bps(*rate_bps));
                let cap = max_discount_cents
                    .map(Money::from_cents)
                    .unwrap_or(subtotal);
                discounts += raw.min(cap);
            }
            Discount::Fixed { amount_cents } => {
                discounts += Money::from_cents(*amount_cents);
            }
            // Realized by the fulfillment layer; no currency effect here.
            Discount::FreeItem { .. } => {}
            Discount::FreeShipping => free_shipping = true,
        }
    }

    // Step 5: resolve one cart-level tier by escalation, charge it once
    let tier = items
        .iter()
        .map(|i| i.shipping_method)
        .max()
        .unwrap_or(ShippingMethod::Free);
    let shipping = if free_shipping {
        Money::zero()
    } else {
        config.shipping_charge(tier, subtotal)
    };

    // Step 6: insurance offsets and copays
    let insurance: Money = items
        .iter()
        .map(|i| i.insurance_offset())
        .fold(Money::zero(), |acc, o| acc + o);
    let copays: Money = items
        .iter()
        .map(|i| i.copay())
        .fold(Money::zero(), |acc, c| acc + c);

    // Step 7: tax after discounts, before shipping and insurance.
    // The tax base floors at zero when stacked discounts exceed the subtotal.
    let tax_base = (subtotal - discounts).clamp_non_negative();
    let tax = tax_base.apply_rate(config.tax_rate());

    // Step 8: final total, clamped at zero
    let final_total =
        (subtotal - discounts + shipping + tax - insurance + copays).clamp_non_negative();

    // Steps 9-11: savings, loyalty points, delivery estimate
    let divisor = config.loyalty_points_divisor_cents.max(1);
    let estimated_delivery = if items.is_empty() {
        ShippingMethod::Standard.delivery_estimate().to_string()
    } else {
        tier.delivery_estimate().to_string()
    };

    CartSummary {
        item_count: items.len(),
        total_quantity: items.iter().map(|i| i.quantity).sum(),
        subtotal_cents: subtotal.cents(),
        discount_cents: discounts.cents(),
        shipping_cents: shipping.cents(),
        tax_cents: tax.cents(),
        insurance_cents: insurance.cents(),
        copay_cents: copays.cents(),
        final_total_cents: final_total.cents(),
        total_savings_cents: (discounts + insurance).cents(),
        loyalty_points_earned: final_total.cents() / divisor,
        estimated_delivery,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
