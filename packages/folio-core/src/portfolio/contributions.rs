//! Dollar trajectory from an index series and a contribution schedule.

use super::stats::round_to;
use crate::types::{ContributionSchedule, DatedValue, Frequency, IndexSeries, Trajectory};
use chrono::{Datelike, NaiveDate};

/// Whether a deposit is due on `current` given the date of the last one.
///
/// - weekly: at least 7 calendar days have passed
/// - monthly: the calendar month (or year) changed
/// - yearly: the calendar year changed
pub fn should_contribute(current: NaiveDate, last: NaiveDate, frequency: Frequency) -> bool {
    match frequency {
        Frequency::Weekly => (current - last).num_days() >= 7,
        Frequency::Monthly => current.month() != last.month() || current.year() != last.year(),
        Frequency::Yearly => current.year() != last.year(),
    }
}

#[derive(Debug, Clone, Copy)]
struct Balance {
    value: f64,
    last_contribution: NaiveDate,
}

/// Compound `initial` along the index and add `amount` at each period boundary.
///
/// The first point is `initial` unrounded; later points are rounded to cents
/// while the running balance keeps full precision. Deposits land after that
/// day's growth has been applied.
pub fn apply_contributions(
    series: &IndexSeries,
    initial: f64,
    amount: f64,
    frequency: Frequency,
) -> Trajectory {
    let Some(first) = series.first() else {
        return Trajectory::default();
    };

    let start = Balance {
        value: initial,
        last_contribution: first.date,
    };
    let mut deposits = 0usize;

    let (_, points) = series.points.windows(2).fold(
        (start, vec![DatedValue::new(first.date, initial)]),
        |(mut balance, mut points), pair| {
            let (prev, cur) = (pair[0], pair[1]);
            balance.value *= cur.value / prev.value;

            if should_contribute(cur.date, balance.last_contribution, frequency) {
                balance.value += amount;
                balance.last_contribution = cur.date;
                deposits += 1;
            }

            points.push(DatedValue::new(cur.date, round_to(balance.value, 2)));
            (balance, points)
        },
    );

    tracing::debug!(
        dates = points.len(),
        deposits,
        %frequency,
        "applied contribution schedule"
    );
    Trajectory::new(points)
}

/// [`apply_contributions`] driven by a [`ContributionSchedule`].
pub fn apply_schedule(series: &IndexSeries, schedule: &ContributionSchedule) -> Trajectory {
    apply_contributions(
        series,
        schedule.initial_value,
        schedule.contribution_amount,
        schedule.frequency,
    )
}
