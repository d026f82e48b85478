//! CSV-backed price provider.
//!
//! Each symbol lives in `<data_dir>/<SYMBOL>.csv` with at least a `Date` and a
//! `Close` column. Full histories are cached on first use and sliced per request.

use super::{slice_or_unavailable, PriceCache, PriceProvider};
use crate::types::{PricePoint, PriceSeries};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads closing prices from per-symbol CSV files.
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    data_dir: PathBuf,
    cache: Arc<PriceCache>,
}

impl CsvPriceProvider {
    /// Create a provider with its own cache.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_cache(data_dir, Arc::new(PriceCache::new()))
    }

    /// Create a provider that shares `cache` with other providers.
    pub fn with_cache(data_dir: impl Into<PathBuf>, cache: Arc<PriceCache>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    /// Path of the CSV file for `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    /// Full cached history for `symbol`, reading the file on a miss.
    pub fn history(&self, symbol: &str) -> Result<Arc<PriceSeries>> {
        self.cache
            .get_or_load(symbol, || read_price_file(symbol, &self.path_for(symbol)))
    }

    /// Warm the cache for `symbols`. Failures are logged and skipped.
    ///
    /// Returns the number of symbols now cached from this call.
    pub fn preload(&self, symbols: &[String]) -> usize {
        let mut loaded = 0;
        for symbol in symbols {
            match self.history(symbol) {
                Ok(series) => {
                    tracing::info!(symbol = %series.symbol, rows = series.len(), "preloaded prices");
                    loaded += 1;
                }
                Err(e) => tracing::warn!(symbol = %symbol, error = %e, "failed to preload prices"),
            }
        }
        loaded
    }
}

impl PriceProvider for CsvPriceProvider {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let full = self.history(symbol)?;
        slice_or_unavailable(&full, start, end)
    }
}

/// Parse a price file into a sorted series.
///
/// Rows with an unparseable date or an empty/non-numeric close are skipped.
fn read_price_file(symbol: &str, path: &Path) -> Result<PriceSeries> {
    let symbol_upper = symbol.to_uppercase();
    if !path.exists() {
        return Err(Error::DataUnavailable(format!(
            "price file not found for {} ({})",
            symbol_upper,
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(str::to_string).collect();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::DataUnavailable(format!(
                "'{}' column missing in {}. Columns: {:?}",
                name, symbol_upper, columns
            ))
        })
    };
    let date_idx = column("Date")?;
    let close_idx = column("Close")?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let date = record.get(date_idx).and_then(parse_date);
        let close = record
            .get(close_idx)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|c| c.is_finite());

        match (date, close) {
            (Some(date), Some(close)) => points.push(PricePoint { date, close }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(symbol = %symbol_upper, skipped, "skipped unusable price rows");
    }

    Ok(PriceSeries::new(&symbol_upper, points))
}

/// Calendar date of a timestamp, normalized to UTC when it carries an offset.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"];
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.naive_utc().date());
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_date_variants() {
        assert_eq!(parse_date("2024-01-02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02 00:00:00-05:00"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02T15:30:00"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02T23:30:00-05:00"), Some(d(2024, 1, 3)));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_fetch_slices_range() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "AAPL.csv",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-04,1,1,1,102.0,10\n\
             2024-01-02,1,1,1,100.0,10\n\
             2024-01-03,1,1,1,101.0,10\n\
             2024-01-05,1,1,1,,10\n",
        );

        let provider = CsvPriceProvider::new(dir.path());
        let series = provider.fetch("aapl", d(2024, 1, 3), d(2024, 1, 31)).unwrap();

        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].date, d(2024, 1, 3));
        assert_eq!(series.points[1].close, 102.0);
    }

    #[test]
    fn test_history_is_cached() {
        let dir = tempdir().unwrap();
        write(dir.path(), "SPY.csv", "Date,Close\n2024-01-02,470.0\n");

        let provider = CsvPriceProvider::new(dir.path());
        provider.history("SPY").unwrap();

        // Removing the file does not matter once cached
        fs::remove_file(dir.path().join("SPY.csv")).unwrap();
        assert!(provider.fetch("SPY", d(2024, 1, 1), d(2024, 1, 31)).is_ok());
        assert!(provider.cache().contains("SPY"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let provider = CsvPriceProvider::new(dir.path());
        let result = provider.fetch("NOPE", d(2024, 1, 1), d(2024, 1, 31));
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_missing_date_column() {
        let dir = tempdir().unwrap();
        write(dir.path(), "BAD.csv", "Day,Close\n2024-01-02,1.0\n");

        let provider = CsvPriceProvider::new(dir.path());
        match provider.fetch("BAD", d(2024, 1, 1), d(2024, 1, 31)) {
            Err(Error::DataUnavailable(msg)) => assert!(msg.contains("'Date' column missing")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_range_is_unavailable() {
        let dir = tempdir().unwrap();
        write(dir.path(), "QQQ.csv", "Date,Close\n2024-01-02,400.0\n");

        let provider = CsvPriceProvider::new(dir.path());
        let result = provider.fetch("QQQ", d(2023, 1, 1), d(2023, 12, 31));
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_preload_counts_successes() {
        let dir = tempdir().unwrap();
        write(dir.path(), "AAPL.csv", "Date,Close\n2024-01-02,100.0\n");

        let provider = CsvPriceProvider::new(dir.path());
        let loaded = provider.preload(&["AAPL".to_string(), "MISSING".to_string()]);

        assert_eq!(loaded, 1);
        assert_eq!(provider.cache().len(), 1);
    }
}
