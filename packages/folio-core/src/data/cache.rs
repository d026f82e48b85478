//! Shared read-through cache of full price histories.

use crate::types::PriceSeries;
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Symbol-keyed cache of immutable price histories.
///
/// Reads take a shared lock. A miss runs the loader outside the lock, so two
/// threads missing the same symbol may both load it; the first insert wins.
#[derive(Debug, Default)]
pub struct PriceCache {
    entries: RwLock<HashMap<String, Arc<PriceSeries>>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached series.
    pub fn get(&self, symbol: &str) -> Option<Arc<PriceSeries>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&symbol.to_uppercase()).cloned()
    }

    /// Insert a series unless one is already cached; returns the cached entry.
    pub fn insert(&self, series: PriceSeries) -> Arc<PriceSeries> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(series.symbol.clone())
            .or_insert_with(|| Arc::new(series))
            .clone()
    }

    /// Return the cached series, loading and caching it on a miss.
    pub fn get_or_load<F>(&self, symbol: &str, load: F) -> Result<Arc<PriceSeries>>
    where
        F: FnOnce() -> Result<PriceSeries>,
    {
        if let Some(series) = self.get(symbol) {
            return Ok(series);
        }

        let series = load()?;
        tracing::debug!(symbol = %series.symbol, rows = series.len(), "cached price history");
        Ok(self.insert(series))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached series.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn series(symbol: &str, close: f64) -> PriceSeries {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceSeries::from_pairs(symbol, vec![(date, close)])
    }

    #[test]
    fn test_get_or_load_populates_once() {
        let cache = PriceCache::new();
        let loads = Cell::new(0);

        for _ in 0..3 {
            let loaded = cache
                .get_or_load("aapl", || {
                    loads.set(loads.get() + 1);
                    Ok(series("AAPL", 190.0))
                })
                .unwrap();
            assert_eq!(loaded.points[0].close, 190.0);
        }

        assert_eq!(loads.get(), 1);
        assert!(cache.contains("AAPL"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = PriceCache::new();
        cache.insert(series("AAPL", 1.0));
        let kept = cache.insert(series("AAPL", 2.0));
        assert_eq!(kept.points[0].close, 1.0);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = PriceCache::new();
        let result = cache.get_or_load("NOPE", || {
            Err(Error::DataUnavailable("missing".to_string()))
        });

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_reads() {
        let cache = Arc::new(PriceCache::new());
        cache.insert(series("SPY", 500.0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get("SPY").map(|s| s.points[0].close))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(500.0));
        }
    }

    #[test]
    fn test_clear() {
        let cache = PriceCache::new();
        cache.insert(series("SPY", 500.0));
        cache.clear();
        assert!(cache.is_empty());
    }
}
