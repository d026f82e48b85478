//! Risk statistics: volatility, drawdown, Sharpe and Sortino.
//!
//! Ratios are annual: CAGR minus the risk-free rate, over annualized
//! (downside) volatility. A zero denominator or a ratio above
//! [`RATIO_CAP`] yields `NaN` rather than an error.

use super::stats::{is_near_zero, sample_std};

/// Trading days per year used to annualize daily figures.
pub const TRADING_DAYS: f64 = 252.0;

/// Ratios above this are treated as numerical noise.
pub const RATIO_CAP: f64 = 1000.0;

/// Annualized sample standard deviation of daily returns.
pub fn annualized_volatility(daily_returns: &[f64]) -> f64 {
    sample_std(daily_returns) * TRADING_DAYS.sqrt()
}

/// Fractional distance below the running peak at each point (all values ≤ 0).
pub fn drawdowns(values: &[f64]) -> Vec<f64> {
    let mut running_max = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&value| {
            running_max = running_max.max(value);
            (value - running_max) / running_max
        })
        .collect()
}

/// Deepest drawdown as a non-positive fraction (e.g. -0.25 for a 25% decline).
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdowns(values).into_iter().fold(0.0, f64::min)
}

/// Annualized standard deviation of the daily returns below the daily risk-free rate.
pub fn downside_deviation(daily_returns: &[f64], risk_free_rate: f64) -> f64 {
    let daily_rf = risk_free_rate / TRADING_DAYS;
    let downside: Vec<f64> = daily_returns
        .iter()
        .copied()
        .filter(|&r| r < daily_rf)
        .collect();
    sample_std(&downside) * TRADING_DAYS.sqrt()
}

/// Excess annual return per unit of `risk`, with the degenerate cases mapped to `NaN`.
fn capped_ratio(cagr: f64, risk_free_rate: f64, risk: f64) -> f64 {
    if is_near_zero(risk) {
        return f64::NAN;
    }
    let ratio = (cagr - risk_free_rate) / risk;
    if ratio > RATIO_CAP {
        f64::NAN
    } else {
        ratio
    }
}

/// Sharpe ratio from CAGR and annualized volatility.
pub fn sharpe_ratio(cagr: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    capped_ratio(cagr, risk_free_rate, volatility)
}

/// Sortino ratio from CAGR and the daily return series.
pub fn sortino_ratio(cagr: f64, daily_returns: &[f64], risk_free_rate: f64) -> f64 {
    capped_ratio(
        cagr,
        risk_free_rate,
        downside_deviation(daily_returns, risk_free_rate),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_annualized_volatility() {
        let returns = [0.01, -0.01, 0.02, -0.02, 0.01, -0.01, 0.015, -0.015, 0.005, -0.005];
        let vol = annualized_volatility(&returns);

        assert!(vol > 0.10);
        assert!(vol < 0.50);
        assert_relative_eq!(vol, sample_std(&returns) * 252f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        let values = [100.0, 110.0, 115.5, 98.175, 88.3575, 92.775375];
        let mdd = max_drawdown(&values);

        // (88.3575 - 115.5) / 115.5
        assert_relative_eq!(mdd, -0.235, epsilon = 1e-9);
    }

    #[test]
    fn test_max_drawdown_non_decreasing_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 100.0, 101.0, 105.0]), 0.0);
    }

    #[test]
    fn test_drawdowns_never_positive() {
        let values = [5.0, 3.0, 8.0, 1.0, 9.0, 9.0, 2.0];
        assert!(drawdowns(&values).iter().all(|&dd| dd <= 0.0));
    }

    #[test]
    fn test_sharpe_ratio() {
        assert_relative_eq!(sharpe_ratio(0.12, 0.20, 0.02), 0.5, epsilon = 1e-12);
        assert!(sharpe_ratio(0.12, 0.20, 0.02) > sharpe_ratio(0.05, 0.20, 0.02));
        assert!(sharpe_ratio(-0.05, 0.20, 0.02) < 0.0);
    }

    #[test]
    fn test_sharpe_zero_volatility_is_nan() {
        assert!(sharpe_ratio(0.10, 0.0, 0.02).is_nan());
    }

    #[test]
    fn test_runaway_ratio_is_nan() {
        assert!(sharpe_ratio(50.0, 0.001, 0.02).is_nan());
        // Large negative ratios are kept
        assert!(sharpe_ratio(-50.0, 0.001, 0.02) < -1000.0);
    }

    #[test]
    fn test_sortino_uses_only_downside() {
        let returns = [0.02, -0.01, 0.03, -0.02, 0.01, -0.005];
        let downside = downside_deviation(&returns, 0.02);
        let expected = sample_std(&[-0.01, -0.02, -0.005]) * 252f64.sqrt();
        assert_relative_eq!(downside, expected, epsilon = 1e-12);

        let sortino = sortino_ratio(0.15, &returns, 0.02);
        assert_relative_eq!(sortino, 0.13 / expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sortino_without_downside_is_nan() {
        // A single downside return has no sample deviation
        assert!(sortino_ratio(0.10, &[0.01, 0.02, -0.01], 0.02).is_nan());
        assert!(sortino_ratio(0.10, &[0.01, 0.02, 0.03], 0.02).is_nan());
    }
}
