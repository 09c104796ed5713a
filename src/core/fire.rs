use tracing::debug;

use super::numeric::{finite_or_zero, non_negative};
use super::types::{FireInputs, FireProjectionEntry, FireResult};

/// Below this gap between return and inflation the annuity formula is replaced
/// by the perpetuity.
const REAL_RETURN_EPSILON: f64 = 0.0001;

/// Oldest age accepted at the request boundaries.
pub const MAX_AGE: u32 = 150;

/// Portfolio needed at `terminal_age` to fund inflating expenses.
///
/// The net withdrawal rate is `swr * (1 - reinvestment)`. Two estimates are
/// made and the larger wins:
///
/// * perpetual: `future_expenses / net_rate`
/// * finite horizon: present value of `years` inflating withdrawals discounted
///   at the nominal return, falling back to the perpetual value when return and
///   inflation are within 0.01% of each other.
///
/// Known gap: reinvestment only enters the perpetual estimate. The
/// finite-horizon annuity ignores it, so with `reinvestment > 0` and returns
/// close to inflation the two estimates do not describe the same withdrawal.
///
/// The series starts at `terminal_age` with the required portfolio and runs
/// for `years + 1` entries: each year the inflated expense is withdrawn, the
/// remainder grows at the nominal return and is floored at zero.
///
/// Inputs whose figures overflow `f64` (centuries of high inflation, say)
/// collapse to the zero result, like a non-viable withdrawal rate.
pub fn compute_fire(inputs: &FireInputs) -> FireResult {
    let years = inputs.terminal_age.saturating_sub(inputs.current_age);
    let swr = finite_or_zero(inputs.swr);
    let reinvestment = finite_or_zero(inputs.reinvestment);
    let net_rate = swr * (1.0 - reinvestment);
    if net_rate <= 0.0 {
        debug!(swr, reinvestment, "no viable withdrawal rate");
        return FireResult::default();
    }

    let expenses = non_negative(inputs.annual_expenses);
    let inflation = finite_or_zero(inputs.inflation_rate);
    let nominal_return = finite_or_zero(inputs.expected_return);

    let future_expenses = expenses * (1.0 + inflation).powf(years as f64);
    let perpetual_estimate = future_expenses / net_rate;
    let finite_horizon_estimate =
        finite_horizon_value(future_expenses, inflation, nominal_return, years)
            .unwrap_or(perpetual_estimate);
    let required = perpetual_estimate.max(finite_horizon_estimate);

    let series = project_drawdown(
        required,
        future_expenses,
        inflation,
        nominal_return,
        inputs.terminal_age,
        years,
    );

    let result = FireResult {
        fire_number: required,
        future_expenses,
        effective_withdrawal_rate: net_rate,
        perpetual_estimate,
        finite_horizon_estimate,
        years,
        series,
    };
    if !is_finite_result(&result) {
        debug!(years, inflation, nominal_return, "fire figures overflow");
        return FireResult::default();
    }
    result
}

fn is_finite_result(result: &FireResult) -> bool {
    [
        result.fire_number,
        result.future_expenses,
        result.effective_withdrawal_rate,
        result.perpetual_estimate,
        result.finite_horizon_estimate,
    ]
    .iter()
    .all(|v| v.is_finite())
        && result
            .series
            .iter()
            .all(|e| e.portfolio.is_finite() && e.expense.is_finite())
}

fn finite_horizon_value(
    future_expenses: f64,
    inflation: f64,
    nominal_return: f64,
    years: u32,
) -> Option<f64> {
    let spread = nominal_return - inflation;
    if spread.abs() <= REAL_RETURN_EPSILON {
        return None;
    }
    let decay = ((1.0 + inflation) / (1.0 + nominal_return)).powf(years as f64);
    let value = future_expenses * (1.0 - decay) / spread;
    value.is_finite().then_some(value)
}

fn project_drawdown(
    start: f64,
    first_expense: f64,
    inflation: f64,
    nominal_return: f64,
    start_age: u32,
    years: u32,
) -> Vec<FireProjectionEntry> {
    let mut portfolio = start;
    let mut expense = first_expense;
    let mut series = Vec::with_capacity(years as usize + 1);

    for year in 0..=years {
        if year > 0 {
            expense *= 1.0 + inflation;
        }
        portfolio = ((portfolio - expense) * (1.0 + nominal_return)).max(0.0);
        series.push(FireProjectionEntry {
            age: start_age.saturating_add(year),
            portfolio,
            expense,
        });
    }

    series
}
