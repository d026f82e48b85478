//! Money-weighted return: XNPV and a Newton-Raphson XIRR.
//!
//! The solver is best-effort. It never fails: on a flat derivative or an
//! exhausted iteration budget it returns its last estimate.

use chrono::NaiveDate;

/// Days per year used to convert day counts into year fractions.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Newton-Raphson settings for [`xirr_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Starting rate
    pub initial_guess: f64,
    /// Iteration cap
    pub max_iterations: usize,
    /// Stop once successive estimates differ by less than this
    pub tolerance: f64,
    /// Forward-difference step for the numeric derivative
    pub derivative_step: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.1,
            max_iterations: 100,
            tolerance: 1e-6,
            derivative_step: 1e-5,
        }
    }
}

/// Outcome of an XIRR solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// Final rate estimate
    pub rate: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the step tolerance was met
    pub converged: bool,
}

/// Net present value of dated cashflows at an annual `rate`.
///
/// Each flow is discounted by `(1 + rate)^(days since first date / 365.25)`.
/// Flows beyond the shorter of the two slices are ignored.
pub fn xnpv(rate: f64, cashflows: &[f64], dates: &[NaiveDate]) -> f64 {
    let Some(&t0) = dates.first() else {
        return 0.0;
    };

    cashflows
        .iter()
        .zip(dates)
        .map(|(cf, date)| {
            let years = (*date - t0).num_days() as f64 / DAYS_PER_YEAR;
            cf / (1.0 + rate).powf(years)
        })
        .sum()
}

/// Internal rate of return of dated cashflows with the default solver settings.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use folio_core::portfolio::xirr;
///
/// let dates = [
///     NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
/// ];
/// let rate = xirr(&[-1000.0, 1100.0], &dates);
/// assert!((rate - 0.0998).abs() < 1e-3);
/// ```
pub fn xirr(cashflows: &[f64], dates: &[NaiveDate]) -> f64 {
    xirr_with(cashflows, dates, &SolverConfig::default()).rate
}

/// Newton-Raphson XIRR with a forward-difference derivative.
pub fn xirr_with(cashflows: &[f64], dates: &[NaiveDate], config: &SolverConfig) -> SolverResult {
    let mut rate = config.initial_guess;

    for iteration in 0..config.max_iterations {
        let npv = xnpv(rate, cashflows, dates);
        let bumped = xnpv(rate + config.derivative_step, cashflows, dates);
        let derivative = (bumped - npv) / config.derivative_step;

        if derivative == 0.0 {
            tracing::debug!(rate, iteration, "xirr derivative vanished");
            return SolverResult {
                rate,
                iterations: iteration,
                converged: false,
            };
        }

        let next = rate - npv / derivative;
        if (next - rate).abs() < config.tolerance {
            tracing::debug!(rate = next, iterations = iteration + 1, "xirr converged");
            return SolverResult {
                rate: next,
                iterations: iteration + 1,
                converged: true,
            };
        }
        rate = next;
    }

    tracing::warn!(rate, iterations = config.max_iterations, "xirr did not converge");
    SolverResult {
        rate,
        iterations: config.max_iterations,
        converged: false,
    }
}
