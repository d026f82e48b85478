//! Portfolio valuation module.
//!
//! Builds the weighted index, applies contributions, and reduces the resulting
//! dollar trajectory to performance metrics.

mod builder;
mod contributions;
mod metrics;
mod performance;
mod risk;
mod stats;
mod xirr;

pub use builder::{blend, build_portfolio, latest_common_start, normalize, ticker_values};
pub use contributions::{apply_contributions, apply_schedule, should_contribute};
pub use metrics::{
    compute_metrics, compute_metrics_with_rate, compute_ticker_metrics, evenly_spaced_dates,
    infer_contributions, InferredCashflows, CONTRIBUTION_ATOL, CONTRIBUTION_RTOL,
};
pub use performance::{
    best_and_worst_year, cagr, daily_returns, total_return, yearly_returns, years_between,
};
pub use risk::{
    annualized_volatility, downside_deviation, drawdowns, max_drawdown, sharpe_ratio,
    sortino_ratio, RATIO_CAP, TRADING_DAYS,
};
pub use stats::round_to;
pub use xirr::{xirr, xirr_with, xnpv, SolverConfig, SolverResult, DAYS_PER_YEAR};
