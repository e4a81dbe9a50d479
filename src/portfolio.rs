//! In-memory holdings collection with an idempotent upsert.

use std::sync::RwLock;
use tracing::debug;

use crate::config::HoldingConfig;

/// One tracked symbol and its held quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub count: f64,
}

/// Ordered, process-lifetime holdings store. Symbols are normalized to
/// upper case and unique; insertion order is preserved for display.
/// There is deliberately no delete: a count of 0 is the "washed out"
/// state and the row stays visible.
pub struct PortfolioStore {
    inner: RwLock<Vec<Holding>>,
}

impl PortfolioStore {
    pub fn new() -> Self {
        PortfolioStore {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Seeds the store from the config file, applying the same upsert
    /// discipline so duplicate config entries collapse to the last one.
    pub fn from_seed(seed: &[HoldingConfig]) -> Self {
        let store = Self::new();
        for h in seed {
            store.upsert(&h.symbol, h.count);
        }
        store
    }

    /// Overwrites the count for an existing symbol or appends a new
    /// holding. Negative counts are clamped to 0.
    pub fn upsert(&self, symbol: &str, count: f64) {
        let symbol = symbol.trim().to_uppercase();
        let count = count.max(0.0);

        let mut holdings = self.inner.write().unwrap();
        if let Some(existing) = holdings.iter_mut().find(|h| h.symbol == symbol) {
            debug!("Updating holding {} to {} units", symbol, count);
            existing.count = count;
        } else {
            debug!("Adding holding {} with {} units", symbol, count);
            holdings.push(Holding { symbol, count });
        }
    }

    /// Consistent copy of the holdings for one valuation pass. Upserts
    /// that land mid-pass take effect on the next cycle.
    pub fn snapshot(&self) -> Vec<Holding> {
        self.inner.read().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

impl Default for PortfolioStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_appends_in_order() {
        let store = PortfolioStore::new();
        store.upsert("BTC", 0.5);
        store.upsert("AAPL", 10.0);
        store.upsert("005930", 12.0);

        let holdings = store.snapshot();
        assert_eq!(holdings.len(), 3);
        assert_eq!(holdings[0].symbol, "BTC");
        assert_eq!(holdings[1].symbol, "AAPL");
        assert_eq!(holdings[2].symbol, "005930");
    }

    #[test]
    fn test_upsert_overwrites_count() {
        let store = PortfolioStore::new();
        store.upsert("BTC", 0.5);
        store.upsert("btc", 1.25);

        let holdings = store.snapshot();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "BTC");
        assert_eq!(holdings[0].count, 1.25);
    }

    #[test]
    fn test_upsert_to_zero_keeps_holding() {
        let store = PortfolioStore::new();
        store.upsert("ETH", 2.0);
        store.upsert("ETH", 0.0);

        let holdings = store.snapshot();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].count, 0.0);
    }

    #[test]
    fn test_symbol_is_normalized() {
        let store = PortfolioStore::new();
        store.upsert(" aapl ", 3.0);

        let holdings = store.snapshot();
        assert_eq!(holdings[0].symbol, "AAPL");
    }

    #[test]
    fn test_seed_collapses_duplicates() {
        let seed = vec![
            HoldingConfig {
                symbol: "btc".to_string(),
                count: 0.5,
            },
            HoldingConfig {
                symbol: "AAPL".to_string(),
                count: 10.0,
            },
            HoldingConfig {
                symbol: "BTC".to_string(),
                count: 0.75,
            },
        ];

        let store = PortfolioStore::from_seed(&seed);
        let holdings = store.snapshot();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].symbol, "BTC");
        assert_eq!(holdings[0].count, 0.75);
        assert_eq!(holdings[1].symbol, "AAPL");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = PortfolioStore::new();
        store.upsert("BTC", 0.5);

        let snap = store.snapshot();
        store.upsert("BTC", 9.0);
        assert_eq!(snap[0].count, 0.5);
        assert_eq!(store.snapshot()[0].count, 9.0);
    }
}
