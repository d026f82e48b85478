//! Price data access.
//!
//! The engine only needs closing prices per symbol within a date range; this
//! module defines that contract and ships two providers plus a shared cache.

mod cache;
mod csv_provider;

pub use cache::PriceCache;
pub use csv_provider::CsvPriceProvider;

use crate::types::PriceSeries;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of closing prices.
pub trait PriceProvider {
    /// Fetch the closing prices for `symbol` within `[start, end]`.
    ///
    /// Fails with [`Error::DataUnavailable`] when the symbol is unknown or the
    /// range contains no rows.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for &P {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        (**self).fetch(symbol, start, end)
    }
}

impl<P: PriceProvider + ?Sized> PriceProvider for Arc<P> {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        (**self).fetch(symbol, start, end)
    }
}

/// In-memory provider over series the caller already holds.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceProvider {
    series: HashMap<String, PriceSeries>,
}

impl StaticPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under its (uppercase) symbol, replacing any previous one.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol.clone(), series);
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }
}

impl PriceProvider for StaticPriceProvider {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let symbol_upper = symbol.to_uppercase();
        let full = self
            .series
            .get(&symbol_upper)
            .ok_or_else(|| Error::DataUnavailable(format!("unknown symbol: {}", symbol_upper)))?;

        slice_or_unavailable(full, start, end)
    }
}

/// Restrict `full` to the range, failing when nothing is left.
pub(crate) fn slice_or_unavailable(
    full: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries> {
    let sliced = full.slice(start, end);
    if sliced.is_empty() {
        return Err(Error::DataUnavailable(format!(
            "no data for {} between {} and {}",
            full.symbol, start, end
        )));
    }
    Ok(sliced)
}
