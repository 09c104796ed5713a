use tracing::debug;

use super::numeric::{finite_or_zero, round2};
use super::types::{DownPaymentInputs, DownPaymentResult, SavingsEntry};

pub const DOWN_PAYMENT_MAX_MONTHS: u32 = 360;

/// Projects monthly saving toward the down payment `property_cost * (1 - ltv)`.
///
/// The target is rounded to cents before use, so `target_amount`, the
/// `total_saved` cap and every `pace` percentage are relative to the rounded
/// figure rather than the raw product.
///
/// Stops at the first month the balance reaches the target, or after
/// [`DOWN_PAYMENT_MAX_MONTHS`]. The reported `total_saved` is clamped to the
/// target even though the underlying balance may overshoot it.
pub fn project_down_payment(inputs: &DownPaymentInputs) -> DownPaymentResult {
    let property_cost = finite_or_zero(inputs.property_cost);
    let monthly_savings = finite_or_zero(inputs.monthly_savings);
    if property_cost <= 0.0 || monthly_savings <= 0.0 {
        debug!(property_cost, monthly_savings, "degenerate down payment inputs");
        return DownPaymentResult {
            schedule: Vec::new(),
            target_amount: 0.0,
            months_needed: None,
        };
    }

    let ltv = finite_or_zero(inputs.desired_ltv).clamp(0.0, 1.0);
    let target_amount = round2(property_cost * (1.0 - ltv));
    if target_amount <= 0.0 {
        // fully financed: nothing to save
        return DownPaymentResult {
            schedule: Vec::new(),
            target_amount: 0.0,
            months_needed: Some(0),
        };
    }

    let mut balance = 0.0;
    let mut months_needed = None;
    let mut schedule = Vec::new();

    for month in 1..=DOWN_PAYMENT_MAX_MONTHS {
        balance += monthly_savings;
        let total_saved = balance.min(target_amount);
        schedule.push(SavingsEntry {
            month,
            total_saved: round2(total_saved),
            pace: round2(total_saved / target_amount * 100.0),
        });
        if balance >= target_amount {
            months_needed = Some(month);
            break;
        }
    }

    DownPaymentResult {
        schedule,
        target_amount,
        months_needed,
    }
}
