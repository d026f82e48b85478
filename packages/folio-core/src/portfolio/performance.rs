//! Return statistics over a dated value series.

use super::stats::pct_change;
use super::xirr::DAYS_PER_YEAR;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Fractional change from `initial` to `ending`.
pub fn total_return(initial: f64, ending: f64) -> f64 {
    ending / initial - 1.0
}

/// Elapsed time between two dates in years of 365.25 days.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / DAYS_PER_YEAR
}

/// Compound annual growth rate; `NaN` when no time has elapsed.
pub fn cagr(initial: f64, ending: f64, years: f64) -> f64 {
    if years > 0.0 {
        (ending / initial).powf(1.0 / years) - 1.0
    } else {
        f64::NAN
    }
}

/// Day-over-day fractional changes (one shorter than `values`).
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    pct_change(values)
}

/// Return within each calendar year: last value of the year over the first, minus one.
///
/// Only years that contain at least one observation appear.
pub fn yearly_returns(dates: &[NaiveDate], values: &[f64]) -> BTreeMap<i32, f64> {
    let mut bounds: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
    for (date, &value) in dates.iter().zip(values) {
        bounds
            .entry(date.year())
            .and_modify(|(_, last)| *last = value)
            .or_insert((value, value));
    }

    bounds
        .into_iter()
        .map(|(year, (first, last))| (year, last / first - 1.0))
        .collect()
}

/// Best and worst calendar-year returns; `NaN` for both when there are no years.
pub fn best_and_worst_year(yearly: &BTreeMap<i32, f64>) -> (f64, f64) {
    let finite = yearly.values().copied().filter(|r| !r.is_nan());
    finite.fold((f64::NAN, f64::NAN), |(best, worst), r| {
        (
            if best.is_nan() { r } else { best.max(r) },
            if worst.is_nan() { r } else { worst.min(r) },
        )
    })
}
