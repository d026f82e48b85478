//! Core data types for the folio engine.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Mapping from symbol to the fraction of capital allocated to it.
///
/// Weights are not required to sum to 1. A zero weight keeps the symbol's
/// dates in the alignment but adds nothing to the blended value.
pub type PortfolioWeights = BTreeMap<String, f64>;

/// A single closing price observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

/// Closing prices for one symbol, ordered by date with no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    /// Ticker symbol (uppercase)
    pub symbol: String,
    /// Price observations in ascending date order
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a series, sorting by date and keeping the last observation for a repeated date.
    pub fn new(symbol: &str, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol: symbol.to_uppercase(),
            points: deduped,
        }
    }

    /// Create a series from `(date, close)` pairs.
    pub fn from_pairs(symbol: &str, pairs: Vec<(NaiveDate, f64)>) -> Self {
        let points = pairs
            .into_iter()
            .map(|(date, close)| PricePoint { date, close })
            .collect();
        Self::new(symbol, points)
    }

    /// Observations falling within `[start, end]`, inclusive on both ends.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Drop observations whose close is missing (NaN) or infinite.
    pub fn drop_missing(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.close.is_finite())
                .copied()
                .collect(),
        }
    }

    /// First observation, if any.
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A dated scalar, used for both index levels and dollar balances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

impl DatedValue {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

macro_rules! dated_series {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
        pub struct $name {
            pub points: Vec<DatedValue>,
        }

        impl $name {
            pub fn new(points: Vec<DatedValue>) -> Self {
                Self { points }
            }

            /// Build from parallel date and value slices (truncated to the shorter one).
            pub fn from_parts(dates: &[NaiveDate], values: &[f64]) -> Self {
                Self {
                    points: dates
                        .iter()
                        .zip(values)
                        .map(|(&date, &value)| DatedValue { date, value })
                        .collect(),
                }
            }

            pub fn dates(&self) -> Vec<NaiveDate> {
                self.points.iter().map(|p| p.date).collect()
            }

            pub fn values(&self) -> Vec<f64> {
                self.points.iter().map(|p| p.value).collect()
            }

            pub fn first(&self) -> Option<&DatedValue> {
                self.points.first()
            }

            pub fn last(&self) -> Option<&DatedValue> {
                self.points.last()
            }

            pub fn len(&self) -> usize {
                self.points.len()
            }

            pub fn is_empty(&self) -> bool {
                self.points.is_empty()
            }

            /// Dates formatted as `YYYY-MM-DD`.
            pub fn iso_dates(&self) -> Vec<String> {
                self.points
                    .iter()
                    .map(|p| p.date.format("%Y-%m-%d").to_string())
                    .collect()
            }
        }
    };
}

dated_series!(
    /// Weight-blended index series; each symbol starts at 100 before weighting.
    IndexSeries
);

dated_series!(
    /// Dollar balance per trading date after growth and contributions.
    Trajectory
);

/// How often a contribution is injected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::InvalidFrequency(format!(
                "'{}' (expected one of weekly, monthly, yearly)",
                other
            ))),
        }
    }
}

/// Starting balance plus the recurring deposit rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContributionSchedule {
    /// Dollar balance on the first date
    pub initial_value: f64,
    /// Amount added at each period boundary
    pub contribution_amount: f64,
    /// Period length
    pub frequency: Frequency,
}

impl ContributionSchedule {
    pub fn new(initial_value: f64, contribution_amount: f64, frequency: Frequency) -> Self {
        Self {
            initial_value,
            contribution_amount,
            frequency,
        }
    }
}

/// The twelve portfolio statistics, in reporting order.
///
/// Degenerate ratios (zero volatility, runaway values) are `NaN` and
/// serialize to JSON `null`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MetricsReport {
    /// First trajectory value in dollars
    pub initial_value: f64,
    /// Last trajectory value in dollars
    pub ending_value: f64,
    /// ending / initial - 1
    pub total_return: f64,
    /// Compound annual growth rate
    pub cagr: f64,
    /// Annualized standard deviation of daily returns
    pub annualized_volatility: f64,
    /// Highest calendar-year return
    pub best_year: f64,
    /// Lowest calendar-year return
    pub worst_year: f64,
    /// Deepest peak-to-trough decline (non-positive)
    pub max_drawdown: f64,
    /// (CAGR - risk free) / volatility
    pub sharpe_ratio: f64,
    /// (CAGR - risk free) / downside volatility
    pub sortino_ratio: f64,
    /// Initial value plus every inferred deposit, without growth
    pub total_contributions: f64,
    /// Money-weighted rate of return (XIRR)
    pub mwrr: f64,
}

impl MetricsReport {
    pub const LABELS: [&'static str; 12] = [
        "Initial Value",
        "Ending Value",
        "Total Return",
        "CAGR",
        "Annualized Std Dev",
        "Best Year Return",
        "Worst Year Return",
        "Maximum Drawdown",
        "Sharpe Ratio",
        "Sortino Ratio",
        "Total Contributions",
        "MWRR",
    ];

    /// Values in the fixed reporting order.
    pub fn to_array(&self) -> [f64; 12] {
        [
            self.initial_value,
            self.ending_value,
            self.total_return,
            self.cagr,
            self.annualized_volatility,
            self.best_year,
            self.worst_year,
            self.max_drawdown,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.total_contributions,
            self.mwrr,
        ]
    }
}

/// Per-symbol statistics (no contribution or MWRR fields).
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TickerMetrics {
    pub cagr: f64,
    pub annualized_volatility: f64,
    pub best_year: f64,
    pub worst_year: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

impl TickerMetrics {
    pub const LABELS: [&'static str; 7] = [
        "CAGR",
        "Annualized Std Dev",
        "Best Year Return",
        "Worst Year Return",
        "Maximum Drawdown",
        "Sharpe Ratio",
        "Sortino Ratio",
    ];

    pub fn to_array(&self) -> [f64; 7] {
        [
            self.cagr,
            self.annualized_volatility,
            self.best_year,
            self.worst_year,
            self.max_drawdown,
            self.sharpe_ratio,
            self.sortino_ratio,
        ]
    }
}

/// Wire shape for a portfolio run: dates, dollar values, raw index and the metrics array.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub dates: Vec<String>,
    pub portfolio: Vec<f64>,
    pub raw: Vec<f64>,
    pub data: Vec<f64>,
}

impl PortfolioReport {
    pub fn new(index: &IndexSeries, trajectory: &Trajectory, metrics: &MetricsReport) -> Self {
        Self {
            dates: trajectory.iso_dates(),
            portfolio: trajectory.values(),
            raw: index.values(),
            data: metrics.to_array().to_vec(),
        }
    }
}

/// Wire shape for the per-symbol chart: normalized values and stats per symbol.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerChart {
    pub ticker_vals: BTreeMap<String, Vec<f64>>,
    pub ticker_stats: BTreeMap<String, Vec<f64>>,
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
