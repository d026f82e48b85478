//! Folio Core - Portfolio valuation and performance metrics library.
//!
//! This crate turns historical closing prices into portfolio analytics:
//!
//! - **Portfolio building**: Normalize each symbol to 100, weight it, and blend on common dates
//! - **Contributions**: Compound a dollar balance along the blended index with periodic deposits
//! - **Metrics**: CAGR, volatility, best/worst year, drawdown, Sharpe, Sortino, MWRR
//! - **Price data**: A provider trait with a CSV-backed implementation and a shared cache
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use folio_core::data::StaticPriceProvider;
//! use folio_core::portfolio::{apply_contributions, build_portfolio, compute_metrics};
//! use folio_core::{Frequency, PortfolioWeights, PriceSeries};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
//! let mut provider = StaticPriceProvider::new();
//! provider.insert(PriceSeries::from_pairs("AAA", vec![(d(2), 10.0), (d(3), 11.0), (d(4), 12.0)]));
//!
//! let mut weights = PortfolioWeights::new();
//! weights.insert("AAA".to_string(), 1.0);
//!
//! let index = build_portfolio(&provider, &weights, d(1), d(31)).unwrap();
//! let trajectory = apply_contributions(&index, 1000.0, 0.0, Frequency::Monthly);
//! let report = compute_metrics(&index, &trajectory).unwrap();
//! assert_eq!(report.ending_value, 1200.0);
//! ```

pub mod config;
pub mod data;
pub mod portfolio;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use types::{
    ApiResponse, ContributionSchedule, DatedValue, Frequency, IndexSeries, MetricsReport,
    PortfolioReport, PortfolioWeights, PricePoint, PriceSeries, TickerChart, TickerMetrics,
    Trajectory,
};

// Re-export main functionality
pub use data::{CsvPriceProvider, PriceCache, PriceProvider, StaticPriceProvider};
pub use portfolio::{
    apply_contributions, build_portfolio, compute_metrics, compute_ticker_metrics, xirr, xnpv,
};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("No valid tickers: {0}")]
    NoValidTickers(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
