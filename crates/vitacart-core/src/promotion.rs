//! # Promotion Catalog
//!
//! Promotion definitions and the single source of truth for eligibility.
//!
//! ## Eligibility Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              When is a promotion eligible?                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  1. NOT expired            now <= expires_at (or no expiry)     │   │
//! │  │  2. Activated              auto_apply OR code ∈ applied codes   │   │
//! │  │  3. Threshold met          subtotal >= min_purchase             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Expiry beats everything: an expired promotion is excluded no matter   │
//! │  what other flags say. Eligibility is re-derived on EVERY recompute    │
//! │  from a supplied "now" - the catalog never reads the wall clock.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stacking
//! Every eligible promotion accumulates into the discount total, in catalog
//! order. This is NOT a best-of model: two eligible 20%-off promotions take
//! 40% off. The `priority` field is carried in the data model so a best-of
//! policy could be introduced later, but the engine does not consult it
//! today. Flagged for product clarification.
//!
//! ## Load-Time Validation
//! A malformed promotion (zero or negative amount, rate above 100%, no
//! activation path) is a fatal configuration error at catalog load. It must
//! never reach a recompute where it could distort a checkout total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CatalogError, CoreError, CoreResult};
use crate::money::{Money, Rate};

// =============================================================================
// Promotion Kind
// =============================================================================

/// Business classification of a promotion.
///
/// The kind describes why the promotion exists; the [`Discount`] describes
/// what it does to the total. `Bogo`, `Bundle`, and `FreeItem`-style kinds
/// are realized by the fulfillment/catalog layer, not by the currency math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    Discount,
    Bogo,
    FreeShipping,
    Bundle,
    Loyalty,
    FirstTime,
}

// =============================================================================
// Discount
// =============================================================================

/// What an eligible promotion contributes to the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the subtotal, optionally capped.
    ///
    /// Contribution = `min(subtotal × rate, max_discount ?? subtotal)`.
    Percentage {
        #[serde(rename = "rateBps")]
        rate_bps: u32,
        #[serde(
            rename = "maxDiscountCents",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        max_discount_cents: Option<i64>,
    },

    /// Fixed amount off the subtotal.
    Fixed {
        #[serde(rename = "amountCents")]
        amount_cents: i64,
    },

    /// A free product added at fulfillment. Does not change the currency
    /// total here.
    FreeItem {
        #[serde(
            rename = "productId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        product_id: Option<String>,
    },

    /// Forces the cart-level shipping charge to zero, regardless of the
    /// resolved tier.
    #[serde(rename = "shipping")]
    FreeShipping,
}

// =============================================================================
// Promotion
// =============================================================================

/// Applicability scope: which products or categories a promotion targets.
///
/// Consumed by the fulfillment layer for `FreeItem`/`Bundle` realization;
/// the currency math is scope-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionScope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// One promotion rule. Read-only configuration, never owned by the cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Stable identifier.
    pub id: String,

    /// Business classification.
    pub kind: PromotionKind,

    /// Effect on the summary.
    pub discount: Discount,

    /// Minimum subtotal before this promotion becomes eligible. Default 0.
    #[serde(default)]
    pub min_purchase_cents: i64,

    /// Product/category applicability scope.
    #[serde(default)]
    pub applies_to: PromotionScope,

    /// Hard expiry; eligible while `now <= expires_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Whether this promotion activates without a code.
    #[serde(default)]
    pub auto_apply: bool,

    /// Ranking for a future best-of policy. Not consulted by the engine.
    #[serde(default)]
    pub priority: i32,

    /// Activation code for non-auto promotions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Promotion {
    /// Returns the minimum purchase as Money.
    #[inline]
    pub fn min_purchase(&self) -> Money {
        Money::from_cents(self.min_purchase_cents)
    }

    /// Whether this promotion is expired at the supplied instant.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if now > expiry)
    }

    /// Whether this promotion forces free shipping when eligible.
    #[inline]
    pub fn grants_free_shipping(&self) -> bool {
        matches!(self.discount, Discount::FreeShipping)
    }

    /// Validates this promotion's configuration.
    fn validate(&self) -> Result<(), CatalogError> {
        match &self.discount {
            Discount::Percentage {
                rate_bps,
                max_discount_cents,
            } => {
                if *rate_bps == 0 || *rate_bps > Rate::FULL_BPS {
                    return Err(CatalogError::InvalidDiscount {
                        id: self.id.clone(),
                        reason: format!("percentage rate {} bps out of (0, 10000]", rate_bps),
                    });
                }
                if matches!(max_discount_cents, Some(cap) if *cap <= 0) {
                    return Err(CatalogError::InvalidDiscount {
                        id: self.id.clone(),
                        reason: "max discount must be positive".to_string(),
                    });
                }
            }
            Discount::Fixed { amount_cents } => {
                if *amount_cents <= 0 {
                    return Err(CatalogError::InvalidDiscount {
                        id: self.id.clone(),
                        reason: "fixed amount must be positive".to_string(),
                    });
                }
            }
            Discount::FreeItem { .. } | Discount::FreeShipping => {}
        }

        if self.min_purchase_cents < 0 {
            return Err(CatalogError::NegativeMinPurchase {
                id: self.id.clone(),
            });
        }

        if !self.auto_apply && self.code.is_none() {
            return Err(CatalogError::Unreachable {
                id: self.id.clone(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Promotion Catalog
// =============================================================================

/// The loaded promotion rule set.
///
/// Catalog order is significant: discounts accumulate in the order
/// promotions appear here.
///
/// Deliberately NOT `Deserialize`: every construction path goes through
/// [`PromotionCatalog::new`], so an unvalidated promotion can never exist
/// inside a catalog. Load from JSON via [`PromotionCatalog::from_json`].
#[derive(Debug, Clone, Default)]
pub struct PromotionCatalog {
    promotions: Vec<Promotion>,
}

impl PromotionCatalog {
    /// Builds a catalog, validating every promotion.
    ///
    /// ## Errors
    /// Any invalid promotion fails the whole load: duplicate ids/codes,
    /// out-of-range discounts, negative thresholds, unreachable promotions.
    pub fn new(promotions: Vec<Promotion>) -> Result<Self, CatalogError> {
        for (idx, promo) in promotions.iter().enumerate() {
            promo.validate()?;

            if promotions[..idx].iter().any(|p| p.id == promo.id) {
                return Err(CatalogError::DuplicateId(promo.id.clone()));
            }
            if let Some(code) = &promo.code {
                if promotions[..idx]
                    .iter()
                    .any(|p| p.code.as_deref() == Some(code))
                {
                    return Err(CatalogError::DuplicateCode(code.clone()));
                }
            }
        }

        Ok(PromotionCatalog { promotions })
    }

    /// An empty catalog (no promotions ever eligible).
    pub fn empty() -> Self {
        PromotionCatalog::default()
    }

    /// Loads and validates a catalog from JSON.
    ///
    /// ## Example
    /// ```rust
    /// use vitacart_core::promotion::PromotionCatalog;
    ///
    /// let catalog = PromotionCatalog::from_json(
    ///     r#"[{
    ///         "id": "welcome20",
    ///         "kind": "discount",
    ///         "discount": { "type": "percentage", "rateBps": 2000 },
    ///         "minPurchaseCents": 5000,
    ///         "autoApply": true
    ///     }]"#,
    /// )
    /// .unwrap();
    /// assert_eq!(catalog.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let promotions: Vec<Promotion> = serde_json::from_str(json)?;
        PromotionCatalog::new(promotions)
    }

    /// Number of promotions in the catalog.
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Checks if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }

    /// All promotions, in catalog order.
    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    /// Looks up a promotion by code.
    pub fn by_code(&self, code: &str) -> Option<&Promotion> {
        self.promotions
            .iter()
            .find(|p| p.code.as_deref() == Some(code))
    }

    /// Eligible promotions for a recompute, in catalog order.
    ///
    /// Eligible = (auto-apply OR code applied) AND not expired AND
    /// subtotal >= min purchase.
    pub fn eligible<'a>(
        &'a self,
        subtotal: Money,
        applied_codes: &'a [String],
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a Promotion> {
        self.promotions.iter().filter(move |p| {
            let activated = p.auto_apply
                || p.code
                    .as_deref()
                    .is_some_and(|c| applied_codes.iter().any(|a| a == c));
            activated && !p.is_expired(now) && subtotal >= p.min_purchase()
        })
    }

    /// Apply-time validation for a promotion code.
    ///
    /// Unknown and expired codes are rejected here so the command processor
    /// can refuse them without mutating state. A min-purchase shortfall is
    /// NOT an apply-time rejection: the code goes into the applied set and
    /// becomes eligible automatically once the subtotal crosses the
    /// threshold.
    pub fn check_code(&self, code: &str, now: DateTime<Utc>) -> CoreResult<&Promotion> {
        let promo = self
            .by_code(code)
            .ok_or_else(|| CoreError::PromotionNotApplicable {
                code: code.to_string(),
                reason: "unknown code".to_string(),
            })?;

        if promo.is_expired(now) {
            return Err(CoreError::PromotionNotApplicable {
                code: code.to_string(),
                reason: "expired".to_string(),
            });
        }

        Ok(promo)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn percentage_promo(id: &str, rate_bps: u32, min_purchase_cents: i64) -> Promotion {
        Promotion {
            id: id.to_string(),
            kind: PromotionKind::Discount,
            discount: Discount::Percentage {
                rate_bps,
                max_discount_cents: None,
            },
            min_purchase_cents,
            applies_to: PromotionScope::default(),
            expires_at: None,
            auto_apply: true,
            priority: 0,
            code: None,
        }
    }

    pub(crate) fn coded_promo(id: &str, code: &str, discount: Discount) -> Promotion {
        Promotion {
            id: id.to_string(),
            kind: PromotionKind::Discount,
            discount,
            min_purchase_cents: 0,
            applies_to: PromotionScope::default(),
            expires_at: None,
            auto_apply: false,
            priority: 0,
            code: Some(code.to_string()),
        }
    }

    fn applied(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_auto_apply_eligibility() {
        let catalog =
            PromotionCatalog::new(vec![percentage_promo("p20", 2000, 5000)]).unwrap();
        let now = Utc::now();

        // Below minimum purchase
        let eligible: Vec<_> = catalog
            .eligible(Money::from_cents(4999), &[], now)
            .collect();
        assert!(eligible.is_empty());

        // At minimum purchase
        let eligible: Vec<_> = catalog
            .eligible(Money::from_cents(5000), &[], now)
            .collect();
        assert_eq!(eligible.len(), 1);
    }

    #[test]
    fn test_coded_promo_requires_exact_code() {
        let catalog = PromotionCatalog::new(vec![coded_promo(
            "save10",
            "SAVE10",
            Discount::Fixed { amount_cents: 1000 },
        )])
        .unwrap();
        let now = Utc::now();
        let subtotal = Money::from_cents(10000);

        assert_eq!(catalog.eligible(subtotal, &[], now).count(), 0);
        assert_eq!(
            catalog
                .eligible(subtotal, &applied(&["save10"]), now)
                .count(),
            0
        );
        assert_eq!(
            catalog
                .eligible(subtotal, &applied(&["SAVE10"]), now)
                .count(),
            1
        );
    }

    #[test]
    fn test_expired_promo_excluded_regardless_of_flags() {
        let mut promo = percentage_promo("old", 2000, 0);
        promo.expires_at = Some(Utc::now() - Duration::days(1));
        let catalog = PromotionCatalog::new(vec![promo]).unwrap();

        let eligible: Vec<_> = catalog
            .eligible(Money::from_cents(10000), &[], Utc::now())
            .collect();
        assert!(eligible.is_empty());
    }

    #[test]
    fn test_check_code_unknown_and_expired() {
        let mut promo = coded_promo("x", "FLASH", Discount::Fixed { amount_cents: 500 });
        promo.expires_at = Some(Utc::now() - Duration::hours(1));
        let catalog = PromotionCatalog::new(vec![promo]).unwrap();
        let now = Utc::now();

        let err = catalog.check_code("NOPE", now).unwrap_err();
        assert!(matches!(err, CoreError::PromotionNotApplicable { .. }));

        let err = catalog.check_code("FLASH", now).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_validation_rejects_bad_rates() {
        let err = PromotionCatalog::new(vec![percentage_promo("z", 0, 0)]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDiscount { .. }));

        let err = PromotionCatalog::new(vec![percentage_promo("h", 10001, 0)]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDiscount { .. }));
    }

    #[test]
    fn test_validation_rejects_unreachable() {
        let mut promo = percentage_promo("ghost", 1000, 0);
        promo.auto_apply = false;
        promo.code = None;
        let err = PromotionCatalog::new(vec![promo]).unwrap_err();
        assert!(matches!(err, CatalogError::Unreachable { .. }));
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let err = PromotionCatalog::new(vec![
            percentage_promo("a", 1000, 0),
            percentage_promo("a", 2000, 0),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(_)));

        let err = PromotionCatalog::new(vec![
            coded_promo("a", "CODE", Discount::Fixed { amount_cents: 100 }),
            coded_promo("b", "CODE", Discount::Fixed { amount_cents: 200 }),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCode(_)));
    }

    #[test]
    fn test_from_json_round_trip() {
        let catalog = PromotionCatalog::from_json(
            r#"[
                {
                    "id": "welcome20",
                    "kind": "discount",
                    "discount": { "type": "percentage", "rateBps": 2000, "maxDiscountCents": 10000 },
                    "minPurchaseCents": 5000,
                    "autoApply": true
                },
                {
                    "id": "freeship",
                    "kind": "free_shipping",
                    "discount": { "type": "shipping" },
                    "code": "SHIPFREE"
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.by_code("SHIPFREE").unwrap().grants_free_shipping());
    }

    #[test]
    fn test_from_json_rejects_negative_fixed_amount() {
        // A negative "discount" would inflate the charge; the load must die
        // before such a promotion can reach a recompute.
        let err = PromotionCatalog::from_json(
            r#"[{
                "id": "bad",
                "kind": "discount",
                "discount": { "type": "fixed", "amountCents": -5000 },
                "autoApply": true
            }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDiscount { .. }));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(
            PromotionCatalog::from_json("not json"),
            Err(CatalogError::Malformed(_))
        ));
    }
}
