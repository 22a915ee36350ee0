//! The stock ledger: the only long-lived mutable state of a run.
//!
//! Quantities never go negative. `consume` fails atomically when stock is
//! short; the allocator clamps its debits instead of relying on failure.

use ahash::AHashMap;

use crate::ProductId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockLedger {
    quantities: AHashMap<ProductId, f64>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded ledger, e.g. from a table's `initial_stock` block.
    pub fn seeded(entries: impl IntoIterator<Item = (ProductId, f64)>) -> Self {
        let mut ledger = Self::new();
        for (product, qty) in entries {
            ledger.add(&product, qty);
        }
        ledger
    }

    /// Merges `qty` (≥ 0) into the product's balance.
    pub fn add(&mut self, product: &ProductId, qty: f64) {
        *self.quantities.entry(product.clone()).or_insert(0.0) += qty;
    }

    /// Debits `qty` (≥ 0) if the full amount is on hand; otherwise fails
    /// without mutating.
    pub fn consume(&mut self, product: &ProductId, qty: f64) -> Result<(), InsufficientStock> {
        let current = self.available(product);
        if current < qty {
            return Err(InsufficientStock {
                product: product.clone(),
                requested: qty,
                available: current,
            });
        }
        if let Some(balance) = self.quantities.get_mut(product) {
            *balance -= qty;
        }
        Ok(())
    }

    /// Current balance; 0 for products the ledger has never seen.
    pub fn available(&self, product: &ProductId) -> f64 {
        self.quantities.get(product).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Snapshot sorted by product id, for reports and serialization.
    pub fn entries_sorted(&self) -> Vec<(ProductId, f64)> {
        let mut entries: Vec<(ProductId, f64)> = self
            .quantities
            .iter()
            .map(|(product, qty)| (product.clone(), *qty))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Returned by [`StockLedger::consume`] when the balance cannot cover the
/// request. Expected and non-fatal: the allocator turns shortages into
/// shortfall records, never into run failures.
#[derive(Debug, Clone, PartialEq)]
pub struct InsufficientStock {
    pub product: ProductId,
    pub requested: f64,
    pub available: f64,
}

impl std::fmt::Display for InsufficientStock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "insufficient stock of '{}': requested {}, available {}",
            self.product, self.requested, self.available
        )
    }
}

impl std::error::Error for InsufficientStock {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId(s.to_string())
    }

    #[test]
    fn add_merges_additively() {
        let mut ledger = StockLedger::new();
        ledger.add(&pid("water"), 10.0);
        ledger.add(&pid("water"), 2.5);
        assert!((ledger.available(&pid("water")) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn available_unknown_product_is_zero() {
        let ledger = StockLedger::new();
        assert!((ledger.available(&pid("ghost"))).abs() < 1e-9);
    }

    #[test]
    fn consume_debits_exact_amount() {
        let mut ledger = StockLedger::seeded([(pid("ore"), 8.0)]);
        ledger.consume(&pid("ore"), 3.0).unwrap();
        assert!((ledger.available(&pid("ore")) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn consume_beyond_balance_fails_without_mutating() {
        let mut ledger = StockLedger::seeded([(pid("ore"), 4.0)]);
        let err = ledger.consume(&pid("ore"), 4.5).unwrap_err();
        assert_eq!(err.product, pid("ore"));
        assert!((err.requested - 4.5).abs() < 1e-9);
        assert!((err.available - 4.0).abs() < 1e-9);
        assert!(
            (ledger.available(&pid("ore")) - 4.0).abs() < 1e-9,
            "failed consume must not debit"
        );
    }

    #[test]
    fn consume_zero_of_unknown_product_succeeds() {
        let mut ledger = StockLedger::new();
        ledger.consume(&pid("ghost"), 0.0).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn entries_sorted_orders_by_product_id() {
        let ledger = StockLedger::seeded([
            (pid("wood"), 1.0),
            (pid("energy"), 2.0),
            (pid("iron"), 3.0),
        ]);
        let entries = ledger.entries_sorted();
        let ids: Vec<&str> = entries.iter().map(|(p, _)| p.0.as_str()).collect();
        assert_eq!(ids, vec!["energy", "iron", "wood"]);
    }
}
