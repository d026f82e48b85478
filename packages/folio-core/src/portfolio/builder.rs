//! Portfolio construction from weighted price series.
//!
//! Every symbol is rescaled so its first in-range close equals 100, then
//! multiplied by its weight. Blending sums the weighted values on the dates
//! that every symbol has in common. Normalizing before weighting is what lets a
//! $3000 stock and a $50 stock combine in proportion to their weights.

use crate::data::PriceProvider;
use crate::types::{DatedValue, IndexSeries, PortfolioWeights, PriceSeries};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Rescale a series so its first close equals 100.
///
/// Missing closes are dropped first. An empty series normalizes to an empty series.
pub fn normalize(series: &PriceSeries) -> IndexSeries {
    let clean = series.drop_missing();
    let base = match clean.first() {
        Some(first) => first.close,
        None => return IndexSeries::default(),
    };

    IndexSeries::new(
        clean
            .points
            .iter()
            .map(|p| DatedValue::new(p.date, p.close / base * 100.0))
            .collect(),
    )
}

/// Blend already-fetched series into one weighted index.
///
/// Dates missing from any series are dropped (inner join). Fails with
/// [`Error::NoValidTickers`] when `weighted` is empty or the series share no dates.
pub fn blend(weighted: &[(PriceSeries, f64)]) -> Result<IndexSeries> {
    if weighted.is_empty() {
        return Err(Error::NoValidTickers("no valid data for any tickers".to_string()));
    }

    let scaled: Vec<BTreeMap<NaiveDate, f64>> = weighted
        .iter()
        .map(|(series, weight)| {
            normalize(series)
                .points
                .into_iter()
                .map(|p| (p.date, p.value * weight))
                .collect()
        })
        .collect();

    let common = common_dates(&scaled);
    if common.is_empty() {
        return Err(Error::NoValidTickers(
            "no overlapping dates across tickers".to_string(),
        ));
    }

    let points = common
        .into_iter()
        .map(|date| {
            let value = scaled.iter().filter_map(|s| s.get(&date)).sum();
            DatedValue::new(date, value)
        })
        .collect();

    Ok(IndexSeries::new(points))
}

/// Dates present in every map.
fn common_dates(series: &[BTreeMap<NaiveDate, f64>]) -> BTreeSet<NaiveDate> {
    let mut iter = series.iter();
    let mut common: BTreeSet<NaiveDate> = match iter.next() {
        Some(first) => first.keys().copied().collect(),
        None => return BTreeSet::new(),
    };
    for other in iter {
        common.retain(|date| other.contains_key(date));
    }
    common
}

/// Build the weighted, normalized portfolio index for `[start, end]`.
///
/// Symbols whose lookup fails are skipped with a warning; if every lookup fails
/// (or `weights` is empty) the build fails with [`Error::NoValidTickers`].
pub fn build_portfolio<P: PriceProvider>(
    provider: &P,
    weights: &PortfolioWeights,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<IndexSeries> {
    let mut weighted = Vec::with_capacity(weights.len());
    let mut failures = Vec::new();

    for (symbol, &weight) in weights {
        match provider.fetch(symbol, start, end) {
            Ok(series) if series.drop_missing().is_empty() => {
                tracing::warn!(symbol = %symbol, "no usable closes in range, skipping");
                failures.push(format!("{}: no usable closes", symbol));
            }
            Ok(series) => weighted.push((series, weight)),
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "skipping symbol");
                failures.push(format!("{}: {}", symbol, e));
            }
        }
    }

    if weighted.is_empty() {
        let detail = if failures.is_empty() {
            "portfolio has no symbols".to_string()
        } else {
            failures.join("; ")
        };
        return Err(Error::NoValidTickers(detail));
    }

    let index = blend(&weighted)?;
    tracing::debug!(
        symbols = weighted.len(),
        skipped = failures.len(),
        dates = index.len(),
        "built portfolio index"
    );
    Ok(index)
}

/// Normalized (first close = 100) series per symbol, for charting.
///
/// Unlike [`build_portfolio`], any failing symbol fails the whole call.
pub fn ticker_values<P: PriceProvider>(
    provider: &P,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<String, IndexSeries>> {
    symbols
        .iter()
        .map(|symbol| {
            let series = provider.fetch(symbol, start, end)?;
            Ok((series.symbol.clone(), normalize(&series)))
        })
        .collect()
}

/// Latest first-available date across `series`, i.e. the earliest date on which
/// every symbol has data.
pub fn latest_common_start(series: &[PriceSeries]) -> Result<NaiveDate> {
    series
        .iter()
        .filter_map(|s| s.drop_missing().first().map(|p| p.date))
        .max()
        .ok_or_else(|| Error::NoValidTickers("no valid start dates in ticker list".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticPriceProvider;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn weights(pairs: &[(&str, f64)]) -> PortfolioWeights {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    fn two_asset_provider() -> StaticPriceProvider {
        StaticPriceProvider::new()
            .with_series(PriceSeries::from_pairs(
                "A",
                vec![(d(2), 100.0), (d(3), 105.0), (d(4), 110.0)],
            ))
            .with_series(PriceSeries::from_pairs(
                "B",
                vec![(d(2), 50.0), (d(3), 50.0), (d(4), 50.0)],
            ))
    }

    #[test]
    fn test_normalize_starts_at_100() {
        let series = PriceSeries::from_pairs("X", vec![(d(2), 3000.0), (d(3), 3300.0)]);
        let normalized = normalize(&series);
        assert_eq!(normalized.points[0].value, 100.0);
        assert_relative_eq!(normalized.points[1].value, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_equal_weight_blend() {
        let provider = two_asset_provider();
        let index =
            build_portfolio(&provider, &weights(&[("A", 0.5), ("B", 0.5)]), d(1), d(31)).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.points[0].value, 100.0);
        // 0.5 * (110 / 100 * 100) + 0.5 * 100
        assert_relative_eq!(index.points[2].value, 105.0, epsilon = 1e-9);
    }

    #[test]
    fn test_price_magnitude_does_not_matter() {
        let provider = StaticPriceProvider::new()
            .with_series(PriceSeries::from_pairs("BIG", vec![(d(2), 3000.0), (d(3), 3300.0)]))
            .with_series(PriceSeries::from_pairs("SMALL", vec![(d(2), 50.0), (d(3), 45.0)]));

        let index = build_portfolio(
            &provider,
            &weights(&[("BIG", 0.5), ("SMALL", 0.5)]),
            d(1),
            d(31),
        )
        .unwrap();

        // +10% and -10% with equal weights cancel out
        assert_relative_eq!(index.points[1].value, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dates_are_intersected() {
        let provider = StaticPriceProvider::new()
            .with_series(PriceSeries::from_pairs(
                "A",
                vec![(d(2), 10.0), (d(3), 11.0), (d(4), 12.0), (d(5), 13.0)],
            ))
            .with_series(PriceSeries::from_pairs(
                "B",
                vec![(d(2), 20.0), (d(4), 22.0), (d(5), 24.0), (d(8), 25.0)],
            ));

        let index =
            build_portfolio(&provider, &weights(&[("A", 0.5), ("B", 0.5)]), d(1), d(31)).unwrap();

        assert_eq!(index.dates(), vec![d(2), d(4), d(5)]);
    }

    #[test]
    fn test_normalization_uses_first_in_range_close() {
        let provider = two_asset_provider();
        let index = build_portfolio(&provider, &weights(&[("A", 1.0)]), d(3), d(31)).unwrap();

        assert_eq!(index.points[0].value, 100.0);
        assert_relative_eq!(index.points[1].value, 110.0 / 105.0 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_weights() {
        let provider = two_asset_provider();
        let result = build_portfolio(&provider, &PortfolioWeights::new(), d(1), d(31));
        assert!(matches!(result, Err(Error::NoValidTickers(_))));
    }

    #[test]
    fn test_all_symbols_fail() {
        let provider = two_asset_provider();
        let result = build_portfolio(&provider, &weights(&[("ZZZ", 1.0)]), d(1), d(31));
        assert!(matches!(result, Err(Error::NoValidTickers(_))));
    }

    #[test]
    fn test_failing_symbol_is_skipped() {
        let provider = two_asset_provider();
        let index =
            build_portfolio(&provider, &weights(&[("A", 1.0), ("ZZZ", 1.0)]), d(1), d(31))
                .unwrap();
        assert_eq!(index.len(), 3);
        assert_relative_eq!(index.points[2].value, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_weight_contributes_nothing() {
        let provider = two_asset_provider();
        let index =
            build_portfolio(&provider, &weights(&[("A", 1.0), ("B", 0.0)]), d(1), d(31)).unwrap();
        assert_relative_eq!(index.points[2].value, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_overlap() {
        let provider = StaticPriceProvider::new()
            .with_series(PriceSeries::from_pairs("A", vec![(d(2), 10.0)]))
            .with_series(PriceSeries::from_pairs("B", vec![(d(3), 10.0)]));

        let result = build_portfolio(&provider, &weights(&[("A", 0.5), ("B", 0.5)]), d(1), d(31));
        assert!(matches!(result, Err(Error::NoValidTickers(_))));
    }

    #[test]
    fn test_ticker_values() {
        let provider = two_asset_provider();
        let values =
            ticker_values(&provider, &["a".to_string(), "B".to_string()], d(1), d(31)).unwrap();

        assert_eq!(values.len(), 2);
        assert_relative_eq!(values["A"].points[2].value, 110.0, epsilon = 1e-9);
        assert_eq!(values["B"].values(), vec![100.0, 100.0, 100.0]);

        let missing = ticker_values(&provider, &["ZZZ".to_string()], d(1), d(31));
        assert!(matches!(missing, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_latest_common_start() {
        let series = vec![
            PriceSeries::from_pairs("A", vec![(d(2), 1.0), (d(3), 1.0)]),
            PriceSeries::from_pairs("B", vec![(d(5), 1.0)]),
            PriceSeries::from_pairs("C", vec![]),
        ];
        assert_eq!(latest_common_start(&series).unwrap(), d(5));
        assert!(latest_common_start(&[]).is_err());
    }
}
