//! # Domain Types
//!
//! Core domain types for the cart and pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ ProductSnapshot  │   │    LineItem      │   │ InsuranceCoverage│    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  product_id      │──►│  id (UUID)       │   │  coverage_bps    │    │
//! │  │  variant/dosage  │   │  quantity        │   │  copay_cents     │    │
//! │  │  unit_price      │   │  unit_price      │   └──────────────────┘    │
//! │  │  rx flags        │   │  rx/sub flags    │                           │
//! │  └──────────────────┘   │  shipping tier   │   ┌──────────────────┐    │
//! │                         │  bundle linkage  │   │ ShippingMethod   │    │
//! │                         └──────────────────┘   │  Free < Standard │    │
//! │                                                │  < Express       │    │
//! │                                                │  < Overnight     │    │
//! │                                                └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `LineItem` is a price/attribute snapshot taken from the product catalog
//! at add-time. It is never re-queried afterward: if the catalog price
//! changes, lines already in the cart keep the price the shopper saw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::{Money, Rate};

// =============================================================================
// Shipping Method
// =============================================================================

/// Per-line shipping tier.
///
/// ## Escalation Ordering
/// Variants are declared from cheapest to most expensive so the derived
/// `Ord` IS the escalation order: the most expensive tier present across
/// all lines wins, and its flat rate is charged once for the whole cart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS, Default,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// No shipping charge regardless of subtotal.
    Free,
    /// Standard ground shipping; free above the configured threshold.
    #[default]
    Standard,
    /// Expedited shipping.
    Express,
    /// Next-day delivery.
    Overnight,
}

impl ShippingMethod {
    /// Customer-facing delivery estimate for this tier.
    pub const fn delivery_estimate(&self) -> &'static str {
        match self {
            ShippingMethod::Overnight => "Tomorrow",
            ShippingMethod::Express => "2-3 days",
            ShippingMethod::Standard | ShippingMethod::Free => "3-5 days",
        }
    }
}

// =============================================================================
// Subscription Frequency
// =============================================================================

/// Refill cadence for subscription line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionFrequency {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

// =============================================================================
// Insurance Coverage
// =============================================================================

/// Insurance terms attached to a covered line.
///
/// The coverage rate is the fraction of the line price assumed reimbursed
/// by the insurance collaborator; the copay is charged once per covered
/// line (per fill, not per unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceCoverage {
    /// Covered fraction in basis points (8000 = 80%).
    pub coverage_rate_bps: u32,

    /// Flat copay in cents, charged once for the line.
    pub copay_cents: i64,
}

impl InsuranceCoverage {
    /// Returns the coverage rate.
    #[inline]
    pub fn coverage_rate(&self) -> Rate {
        Rate::from_bps(self.coverage_rate_bps)
    }

    /// Returns the copay as Money.
    #[inline]
    pub fn copay(&self) -> Money {
        Money::from_cents(self.copay_cents)
    }
}

// =============================================================================
// Product Snapshot
// =============================================================================

/// What the product catalog returns for (product id, variant) at add-time.
///
/// Consulted exactly once per add; the resulting line item freezes every
/// field here and is never re-queried.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Product identifier in the external catalog.
    pub product_id: String,

    /// Variant or dosage (e.g., "500mg", "90-count").
    pub variant: Option<String>,

    /// Display name shown in the cart and on the order.
    pub name: String,

    /// Brand name, if any.
    pub brand: Option<String>,

    /// Catalog category (used by promotion applicability scopes).
    pub category: Option<String>,

    /// Unit price in cents at lookup time.
    pub unit_price_cents: i64,

    /// Whether this product requires a prescription to check out.
    pub prescription_required: bool,

    /// Insurance terms, when the shopper's plan covers this product.
    pub insurance: Option<InsuranceCoverage>,

    /// Identifier of the AI recommendation that surfaced this product,
    /// carried through for attribution only.
    pub recommendation_id: Option<String>,
}

impl ProductSnapshot {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One cart entry representing a product/variant and quantity.
///
/// ## Identity
/// - `id`: UUID v4 generated when the line is appended - command targets
/// - `(product_id, variant)`: merge key - adding the same pair again sums
///   quantities into the existing line instead of appending
///
/// ## Invariants
/// - `quantity` is always >= 1; a transition that would drop it to zero
///   removes the line instead
/// - `line_total_cents()` is rounded at the line level, before summing
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Unique line identifier (UUID v4).
    pub id: String,

    /// Product identifier in the external catalog.
    pub product_id: String,

    /// Variant or dosage at add-time (frozen).
    pub variant: Option<String>,

    /// Product name at add-time (frozen).
    pub name: String,

    /// Brand at add-time (frozen).
    pub brand: Option<String>,

    /// Category at add-time (frozen).
    pub category: Option<String>,

    /// Quantity in cart (>= 1).
    pub quantity: i64,

    /// Unit price in cents at add-time (frozen).
    pub unit_price_cents: i64,

    /// Whether a prescription is required to check out this line.
    pub prescription_required: bool,

    /// Prescriber reference, required for checkout of prescription lines.
    pub prescriber_id: Option<String>,

    /// Dispensing pharmacy reference, required for checkout of prescription lines.
    pub pharmacy_id: Option<String>,

    /// Whether this line is a recurring subscription.
    pub is_subscription: bool,

    /// Refill cadence; set while `is_subscription` is true.
    pub frequency: Option<SubscriptionFrequency>,

    /// Whether refills are ordered automatically.
    pub auto_refill: bool,

    /// Insurance terms for this line, if covered.
    pub insurance: Option<InsuranceCoverage>,

    /// Requested shipping tier for this line. The engine collapses all
    /// per-line tiers into one cart-level charge by escalation.
    pub shipping_method: ShippingMethod,

    /// Bundle this line belongs to, if any.
    pub bundle_id: Option<String>,

    /// Bundle discount in basis points applied to this line's total.
    pub bundle_discount_bps: u32,

    /// AI recommendation attribution carried from the snapshot.
    pub recommendation_id: Option<String>,

    /// When this line was added to the cart.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Creates a new line item from a catalog snapshot.
    ///
    /// ## Price Freezing
    /// The price and attributes are captured at this moment. If the product
    /// changes in the catalog afterward, this line keeps the original values.
    pub fn from_snapshot(snapshot: &ProductSnapshot, quantity: i64, now: DateTime<Utc>) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            product_id: snapshot.product_id.clone(),
            variant: snapshot.variant.clone(),
            name: snapshot.name.clone(),
            brand: snapshot.brand.clone(),
            category: snapshot.category.clone(),
            quantity,
            unit_price_cents: snapshot.unit_price_cents,
            prescription_required: snapshot.prescription_required,
            prescriber_id: None,
            pharmacy_id: None,
            is_subscription: false,
            frequency: None,
            auto_refill: false,
            insurance: snapshot.insurance,
            shipping_method: ShippingMethod::default(),
            bundle_id: None,
            bundle_discount_bps: 0,
            recommendation_id: snapshot.recommendation_id.clone(),
            added_at: now,
        }
    }

    /// Whether this line matches an add-time merge key.
    #[inline]
    pub fn matches(&self, product_id: &str, variant: Option<&str>) -> bool {
        self.product_id == product_id && self.variant.as_deref() == variant
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total in cents: `round2(unit_price × quantity × (1 − bundle%))`.
    ///
    /// Rounded at the line level, before totals are summed, so rounding
    /// error never compounds across the cart.
    pub fn line_total(&self) -> Money {
        let gross = self.unit_price().multiply_quantity(self.quantity);
        if self.bundle_discount_bps == 0 {
            gross
        } else {
            gross.apply_rate(Rate::from_bps(self.bundle_discount_bps).complement())
        }
    }

    /// Insurance offset for this line: `round2(unit_price × qty × coverage)`.
    ///
    /// Zero when the line carries no coverage.
    pub fn insurance_offset(&self) -> Money {
        match &self.insurance {
            Some(cov) => self
                .unit_price()
                .multiply_quantity(self.quantity)
                .apply_rate(cov.coverage_rate()),
            None => Money::zero(),
        }
    }

    /// Copay for this line (flat, once per covered line).
    pub fn copay(&self) -> Money {
        self.insurance.map(|cov| cov.copay()).unwrap_or_default()
    }

    /// Whether this line satisfies the prescription checkout requirements.
    ///
    /// Non-prescription lines always pass; prescription lines need both a
    /// prescriber reference and a pharmacy reference.
    pub fn prescription_satisfied(&self) -> bool {
        !self.prescription_required || (self.prescriber_id.is_some() && self.pharmacy_id.is_some())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn snapshot(product_id: &str, price_cents: i64) -> ProductSnapshot {
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

    #[test]
    fn test_shipping_escalation_order() {
        assert!(ShippingMethod::Overnight > ShippingMethod::Express);
        assert!(ShippingMethod::Express > ShippingMethod::Standard);
        assert!(ShippingMethod::Standard > ShippingMethod::Free);
    }

    #[test]
    fn test_delivery_estimates() {
        assert_eq!(ShippingMethod::Overnight.delivery_estimate(), "Tomorrow");
        assert_eq!(ShippingMethod::Express.delivery_estimate(), "2-3 days");
        assert_eq!(ShippingMethod::Standard.delivery_estimate(), "3-5 days");
        assert_eq!(ShippingMethod::Free.delivery_estimate(), "3-5 days");
    }

    #[test]
    fn test_line_total_plain() {
        let mut item = LineItem::from_snapshot(&snapshot("p1", 2999), 2, Utc::now());
        assert_eq!(item.line_total().cents(), 5998);

        item.quantity = 3;
        assert_eq!(item.line_total().cents(), 8997);
    }

    #[test]
    fn test_line_total_with_bundle_discount() {
        // $29.99 × 2 = $59.98, 15% bundle discount → ×0.85 = $50.983 → $50.98
        let mut item = LineItem::from_snapshot(&snapshot("p1", 2999), 2, Utc::now());
        item.bundle_discount_bps = 1500;
        assert_eq!(item.line_total().cents(), 5098);
    }

    #[test]
    fn test_insurance_offset_and_copay() {
        let mut item = LineItem::from_snapshot(&snapshot("rx1", 10000), 1, Utc::now());
        assert!(item.insurance_offset().is_zero());
        assert!(item.copay().is_zero());

        item.insurance = Some(InsuranceCoverage {
            coverage_rate_bps: 8000,
            copay_cents: 1500,
        });
        assert_eq!(item.insurance_offset().cents(), 8000);
        assert_eq!(item.copay().cents(), 1500);
    }

    #[test]
    fn test_prescription_satisfied() {
        let mut item = LineItem::from_snapshot(&snapshot("rx1", 5000), 1, Utc::now());
        assert!(item.prescription_satisfied()); // not rx-flagged

        item.prescription_required = true;
        assert!(!item.prescription_satisfied());

        item.prescriber_id = Some("dr-1".to_string());
        assert!(!item.prescription_satisfied());

        item.pharmacy_id = Some("ph-1".to_string());
        assert!(item.prescription_satisfied());
    }

    #[test]
    fn test_merge_key_includes_variant() {
        let mut snap = snapshot("p1", 1000);
        snap.variant = Some("500mg".to_string());
        let item = LineItem::from_snapshot(&snap, 1, Utc::now());

        assert!(item.matches("p1", Some("500mg")));
        assert!(!item.matches("p1", Some("250mg")));
        assert!(!item.matches("p1", None));
    }
}
