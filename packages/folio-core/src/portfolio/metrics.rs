//! The twelve-figure portfolio report and the reduced per-symbol report.

use super::performance::{
    best_and_worst_year, cagr, daily_returns, total_return, years_between, yearly_returns,
};
use super::risk::{annualized_volatility, max_drawdown, sharpe_ratio, sortino_ratio};
use super::stats::{is_close, round_to};
use super::xirr::xirr;
use crate::config::DEFAULT_RISK_FREE_RATE;
use crate::types::{IndexSeries, MetricsReport, TickerMetrics, Trajectory};
use crate::{Error, Result};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Relative tolerance when separating deposits from market moves.
pub const CONTRIBUTION_RTOL: f64 = 1e-4;
/// Absolute tolerance (one cent) when separating deposits from market moves.
pub const CONTRIBUTION_ATOL: f64 = 0.01;

/// Deposits recovered from a trajectory, ready for XIRR.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredCashflows {
    /// Initial value plus every inferred deposit
    pub total_contributions: f64,
    /// Investor cashflows: deposits negative, final balance positive
    pub cashflows: Vec<f64>,
}

/// Recover deposits by comparing each balance with pure market growth.
///
/// Day `i` is expected to be `trajectory[i-1] * index[i] / index[i-1]`. Any gap
/// beyond one cent plus 0.01% of the expected value is counted as a deposit.
///
/// Fails with [`Error::InsufficientData`] when the two slices differ in length.
pub fn infer_contributions(index: &[f64], trajectory: &[f64]) -> Result<InferredCashflows> {
    if index.len() != trajectory.len() {
        return Err(Error::InsufficientData(format!(
            "index has {} points but trajectory has {}",
            index.len(),
            trajectory.len()
        )));
    }
    let Some(&initial) = trajectory.first() else {
        return Ok(InferredCashflows {
            total_contributions: 0.0,
            cashflows: Vec::new(),
        });
    };

    let mut total_contributions = initial;
    let mut cashflows = Vec::with_capacity(trajectory.len());
    cashflows.push(-initial);

    for i in 1..trajectory.len() {
        let expected = trajectory[i - 1] * (index[i] / index[i - 1]);
        let actual = trajectory[i];
        if is_close(actual, expected, CONTRIBUTION_RTOL, CONTRIBUTION_ATOL) {
            cashflows.push(0.0);
        } else {
            let deposit = actual - expected;
            total_contributions += deposit;
            cashflows.push(-deposit);
        }
    }

    if let (Some(last_flow), Some(&ending)) = (cashflows.last_mut(), trajectory.last()) {
        *last_flow += ending;
    }

    Ok(InferredCashflows {
        total_contributions,
        cashflows,
    })
}

/// Figures shared by the portfolio and per-symbol reports, unrounded.
#[derive(Debug, Clone, Copy)]
struct RiskReturn {
    cagr: f64,
    volatility: f64,
    best_year: f64,
    worst_year: f64,
    max_drawdown: f64,
    sharpe: f64,
    sortino: f64,
}

fn risk_return(dates: &[NaiveDate], values: &[f64], risk_free_rate: f64) -> RiskReturn {
    let (initial, ending) = (values[0], values[values.len() - 1]);
    let years = years_between(dates[0], dates[dates.len() - 1]);
    let cagr = cagr(initial, ending, years);

    let returns = daily_returns(values);
    let volatility = annualized_volatility(&returns);
    let (best_year, worst_year) = best_and_worst_year(&yearly_returns(dates, values));

    RiskReturn {
        cagr,
        volatility,
        best_year,
        worst_year,
        max_drawdown: max_drawdown(values),
        sharpe: sharpe_ratio(cagr, volatility, risk_free_rate),
        sortino: sortino_ratio(cagr, &returns, risk_free_rate),
    }
}

/// Compute the portfolio report with the default 2% risk-free rate.
pub fn compute_metrics(index: &IndexSeries, trajectory: &Trajectory) -> Result<MetricsReport> {
    compute_metrics_with_rate(index, trajectory, DEFAULT_RISK_FREE_RATE)
}

/// Compute the twelve portfolio figures from the index and its dollar trajectory.
///
/// Fails with [`Error::InsufficientData`] for fewer than two points or when the
/// two series differ in length. Dollar figures are rounded to cents, return
/// figures to four decimals and Sharpe/Sortino to two.
pub fn compute_metrics_with_rate(
    index: &IndexSeries,
    trajectory: &Trajectory,
    risk_free_rate: f64,
) -> Result<MetricsReport> {
    if trajectory.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "need at least 2 portfolio values, got {}",
            trajectory.len()
        )));
    }

    let dates = trajectory.dates();
    let values = trajectory.values();
    let (initial, ending) = (values[0], values[values.len() - 1]);

    let stats = risk_return(&dates, &values, risk_free_rate);
    let inferred = infer_contributions(&index.values(), &values)?;
    let mwrr = xirr(&inferred.cashflows, &dates);

    tracing::debug!(
        points = values.len(),
        total_contributions = inferred.total_contributions,
        mwrr,
        "computed portfolio metrics"
    );

    Ok(MetricsReport {
        initial_value: round_to(initial, 2),
        ending_value: round_to(ending, 2),
        total_return: round_to(total_return(initial, ending), 4),
        cagr: round_to(stats.cagr, 4),
        annualized_volatility: round_to(stats.volatility, 4),
        best_year: round_to(stats.best_year, 4),
        worst_year: round_to(stats.worst_year, 4),
        max_drawdown: round_to(stats.max_drawdown, 4),
        sharpe_ratio: round_to(stats.sharpe, 2),
        sortino_ratio: round_to(stats.sortino, 2),
        total_contributions: round_to(inferred.total_contributions, 2),
        mwrr: round_to(mwrr, 4),
    })
}

/// `count` dates spread evenly from `start` to `end` inclusive, floored to whole days.
pub fn evenly_spaced_dates(start: NaiveDate, end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span = (end - start).num_days();
            let steps = (count - 1) as i64;
            (0..count as i64)
                .map(|i| start + Duration::days((i * span).div_euclid(steps)))
                .collect()
        }
    }
}

/// Per-symbol CAGR, volatility, best/worst year, drawdown, Sharpe and Sortino.
///
/// Each symbol's values are laid on a date grid evenly spaced between `start`
/// and `end`. Fails with [`Error::InsufficientData`] if any symbol has fewer
/// than two values.
pub fn compute_ticker_metrics(
    values: &BTreeMap<String, Vec<f64>>,
    start: NaiveDate,
    end: NaiveDate,
    risk_free_rate: f64,
) -> Result<BTreeMap<String, TickerMetrics>> {
    values
        .iter()
        .map(|(symbol, series)| {
            if series.len() < 2 {
                return Err(Error::InsufficientData(format!(
                    "{} has {} values, need at least 2",
                    symbol,
                    series.len()
                )));
            }

            let dates = evenly_spaced_dates(start, end, series.len());
            let stats = risk_return(&dates, series, risk_free_rate);
            let metrics = TickerMetrics {
                cagr: round_to(stats.cagr, 4),
                annualized_volatility: round_to(stats.volatility, 4),
                best_year: round_to(stats.best_year, 4),
                worst_year: round_to(stats.worst_year, 4),
                max_drawdown: round_to(stats.max_drawdown, 4),
                sharpe_ratio: round_to(stats.sharpe, 2),
                sortino_ratio: round_to(stats.sortino, 2),
            };
            Ok((symbol.clone(), metrics))
        })
        .collect()
}
