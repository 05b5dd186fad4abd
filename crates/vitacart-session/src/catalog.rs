//! # Product Lookup Port
//!
//! The add-time snapshot source. The session consults it exactly once per
//! add; the resulting line item freezes whatever the lookup returned and is
//! never re-queried, so a later price change cannot move a cart that is
//! already built.

use std::collections::HashMap;

use vitacart_core::ProductSnapshot;

/// Port for resolving a (product id, variant) pair to a priced snapshot.
///
/// `None` means the pair is unknown to the catalog; the session turns that
/// into a not-found error before any cart mutation happens.
#[allow(async_fn_in_trait)]
pub trait ProductLookup {
    /// Resolves a product/variant to its current snapshot, if listed.
    async fn snapshot(&self, product_id: &str, variant: Option<&str>) -> Option<ProductSnapshot>;
}

/// In-memory `ProductLookup` backed by a fixed snapshot list.
///
/// Suits tests and seeded demo catalogs; a production deployment would put
/// the live product service behind the same port.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    entries: HashMap<(String, Option<String>), ProductSnapshot>,
}

impl StaticCatalog {
    /// Builds a catalog from a list of snapshots, keyed by (id, variant).
    pub fn new(snapshots: impl IntoIterator<Item = ProductSnapshot>) -> Self {
        let entries = snapshots
            .into_iter()
            .map(|s| ((s.product_id.clone(), s.variant.clone()), s))
            .collect();
        StaticCatalog { entries }
    }

    /// Number of listed products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog lists nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProductLookup for StaticCatalog {
    async fn snapshot(&self, product_id: &str, variant: Option<&str>) -> Option<ProductSnapshot> {
        self.entries
            .get(&(product_id.to_string(), variant.map(str::to_string)))
            .cloned()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(product_id: &str, variant: Option<&str>, price_cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id: product_id.to_string(),
            variant: variant.map(str::to_string),
            name: format!("Product {}", product_id),
            brand: None,
            category: None,
            unit_price_cents: price_cents,
            prescription_required: false,
            insurance: None,
            recommendation_id: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_variant() {
        let catalog = StaticCatalog::new([
            snap("p1", None, 1000),
            snap("p1", Some("500mg"), 1500),
        ]);

        let plain = catalog.snapshot("p1", None).await.unwrap();
        assert_eq!(plain.unit_price_cents, 1000);

        let dosed = catalog.snapshot("p1", Some("500mg")).await.unwrap();
        assert_eq!(dosed.unit_price_cents, 1500);

        assert!(catalog.snapshot("p1", Some("250mg")).await.is_none());
        assert!(catalog.snapshot("ghost", None).await.is_none());
    }
}
