use tracing::debug;

use super::numeric::{finite_or_zero, non_negative, round2};
use super::types::{AmortizationEntry, AmortizationResult, LoanInputs, LoanSummary, LoanType};

/// Longest term accepted at the request boundaries (100 years).
pub const MAX_LOAN_MONTHS: u32 = 1_200;

/// Builds the month-by-month repayment schedule for a loan.
///
/// Every figure is rounded to cents and the rounded balance is carried into
/// the next period. The last period repays whatever balance is left, so the
/// schedule always ends at exactly zero.
///
/// A schedule whose figures overflow `f64` (absurd amounts or rates) is
/// reported as empty rather than carrying infinities.
pub fn amortize(inputs: &LoanInputs) -> AmortizationResult {
    let amount = finite_or_zero(inputs.amount);
    if amount <= 0.0 || inputs.months == 0 {
        debug!(amount, months = inputs.months, "degenerate loan, empty schedule");
        return empty_schedule();
    }

    let monthly_rate = non_negative(inputs.annual_rate) / 12.0 / 100.0;
    let result = match inputs.loan_type {
        LoanType::Emi => amortize_emi(amount, inputs.months, monthly_rate),
        LoanType::InterestOnly => amortize_interest_only(amount, inputs.months, monthly_rate),
    };

    if !result.summary.total_paid.is_finite() || !result.summary.payment.is_finite() {
        debug!(amount, monthly_rate, "loan figures overflow, empty schedule");
        return empty_schedule();
    }
    result
}

/// Fixed instalment for an annuity loan.
///
/// Straight-line when the rate is zero or too small to move `1 + r`. When
/// `(1 + r)^n` overflows, the instalment is its limit `amount * r`.
pub fn emi_payment(amount: f64, months: u32, monthly_rate: f64) -> f64 {
    if months == 0 {
        return 0.0;
    }
    let growth = (1.0 + monthly_rate).powf(months as f64);
    if !growth.is_finite() {
        return amount * monthly_rate;
    }
    if monthly_rate <= 0.0 || growth <= 1.0 {
        return amount / months as f64;
    }
    amount * monthly_rate * growth / (growth - 1.0)
}

fn empty_schedule() -> AmortizationResult {
    AmortizationResult {
        schedule: Vec::new(),
        summary: LoanSummary::default(),
    }
}

fn amortize_emi(amount: f64, months: u32, monthly_rate: f64) -> AmortizationResult {
    let emi = emi_payment(amount, months, monthly_rate);
    let mut ledger = Ledger::new(amount, months);

    for month in 1..=months {
        let interest = round2(ledger.balance * monthly_rate);
        let principal = if month == months {
            ledger.balance
        } else {
            // clamp panics on a NaN bound
            round2(emi - interest).max(0.0).min(ledger.balance)
        };
        ledger.record(month, interest, principal);
    }

    ledger.finish(round2(emi))
}

fn amortize_interest_only(amount: f64, months: u32, monthly_rate: f64) -> AmortizationResult {
    let coupon = round2(amount * monthly_rate);
    let mut ledger = Ledger::new(amount, months);

    for month in 1..=months {
        let principal = if month == months { ledger.balance } else { 0.0 };
        ledger.record(month, coupon, principal);
    }

    ledger.finish(coupon)
}

struct Ledger {
    balance: f64,
    cumulative_interest: f64,
    cumulative_principal: f64,
    schedule: Vec<AmortizationEntry>,
}

impl Ledger {
    fn new(amount: f64, months: u32) -> Self {
        Self {
            balance: round2(amount),
            cumulative_interest: 0.0,
            cumulative_principal: 0.0,
            schedule: Vec::with_capacity(months.min(MAX_LOAN_MONTHS) as usize),
        }
    }

    fn record(&mut self, month: u32, interest: f64, principal: f64) {
        self.balance = round2(self.balance - principal);
        self.cumulative_interest = round2(self.cumulative_interest + interest);
        self.cumulative_principal = round2(self.cumulative_principal + principal);
        self.schedule.push(AmortizationEntry {
            month,
            interest_payment: interest,
            principal_payment: principal,
            total_payment: round2(interest + principal),
            balance_after: self.balance,
            cumulative_interest: self.cumulative_interest,
            cumulative_principal: self.cumulative_principal,
        });
    }

    fn finish(self, payment: f64) -> AmortizationResult {
        let summary = LoanSummary {
            total_interest: self.cumulative_interest,
            total_principal: self.cumulative_principal,
            total_paid: round2(self.cumulative_interest + self.cumulative_principal),
            payment,
            periods: self.schedule.len() as u32,
        };
        AmortizationResult {
            schedule: self.schedule,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const CENT: f64 = 0.01 + 1e-9;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn emi_loan(amount: f64, months: u32, annual_rate: f64) -> LoanInputs {
        LoanInputs {
            amount,
            months,
            annual_rate,
            loan_type: LoanType::Emi,
        }
    }

    #[test]
    fn oracle_emi_payment_matches_annuity_formula() {
        // 100k over 12 months at 12% p.a. -> r = 1%; EMI = 8884.88
        let result = amortize(&emi_loan(100_000.0, 12, 12.0));
        assert_eq!(result.summary.payment, 8_884.88);
        assert_eq!(result.summary.periods, 12);

        let first = result.schedule[0];
        assert_eq!(first.month, 1);
        assert_eq!(first.interest_payment, 1_000.0);
        assert_eq!(first.principal_payment, 7_884.88);
        assert_eq!(first.total_payment, 8_884.88);
        assert_eq!(first.balance_after, 92_115.12);
    }

    #[test]
    fn emi_schedule_pays_off_exactly() {
        let result = amortize(&emi_loan(250_000.0, 240, 6.5));
        let last = result.schedule.last().expect("schedule must not be empty");
        assert_eq!(last.balance_after, 0.0);
        let principal: f64 = result.schedule.iter().map(|e| e.principal_payment).sum();
        assert_approx_tol(principal, 250_000.0, 0.01);
        assert_approx_tol(result.summary.total_principal, 250_000.0, CENT);
        assert_approx_tol(
            result.summary.total_paid,
            result.summary.total_interest + result.summary.total_principal,
            CENT,
        );
    }

    #[test]
    fn zero_rate_is_straight_line() {
        let result = amortize(&emi_loan(12_000.0, 12, 0.0));
        assert_eq!(result.summary.total_interest, 0.0);
        assert_eq!(result.summary.payment, 1_000.0);
        for entry in &result.schedule {
            assert_eq!(entry.principal_payment, 1_000.0);
            assert_eq!(entry.interest_payment, 0.0);
        }
        assert_eq!(result.schedule[11].balance_after, 0.0);
    }

    #[test]
    fn final_period_absorbs_rounding_drift() {
        // 1000 / 3 does not split into cents evenly.
        let result = amortize(&emi_loan(1_000.0, 3, 0.0));
        let principals: Vec<f64> = result.schedule.iter().map(|e| e.principal_payment).collect();
        assert_eq!(principals, vec![333.33, 333.33, 333.34]);
        assert_eq!(result.schedule[2].balance_after, 0.0);
    }

    #[test]
    fn interest_only_repays_principal_at_the_end() {
        let result = amortize(&LoanInputs {
            amount: 50_000.0,
            months: 6,
            annual_rate: 6.0,
            loan_type: LoanType::InterestOnly,
        });
        assert_eq!(result.schedule.len(), 6);
        for entry in &result.schedule[..5] {
            assert_eq!(entry.interest_payment, 250.0);
            assert_eq!(entry.principal_payment, 0.0);
            assert_eq!(entry.balance_after, 50_000.0);
        }
        let last = result.schedule[5];
        assert_eq!(last.principal_payment, 50_000.0);
        assert_eq!(last.total_payment, 50_250.0);
        assert_eq!(last.balance_after, 0.0);
        assert_eq!(result.summary.total_interest, 1_500.0);
        assert_eq!(result.summary.total_paid, 51_500.0);
        assert_eq!(result.summary.payment, 250.0);
    }

    #[test]
    fn degenerate_loans_return_empty_schedule() {
        for inputs in [
            emi_loan(0.0, 12, 5.0),
            emi_loan(-10.0, 12, 5.0),
            emi_loan(f64::NAN, 12, 5.0),
            emi_loan(1_000.0, 0, 5.0),
        ] {
            let result = amortize(&inputs);
            assert!(result.schedule.is_empty());
            assert_eq!(result.summary, LoanSummary::default());
        }
    }

    #[test]
    fn invalid_rate_is_treated_as_zero() {
        let nan_rate = amortize(&emi_loan(1_200.0, 12, f64::NAN));
        let negative = amortize(&emi_loan(1_200.0, 12, -4.0));
        let zero = amortize(&emi_loan(1_200.0, 12, 0.0));
        assert_eq!(nan_rate, zero);
        assert_eq!(negative, zero);
    }

    #[test]
    fn amortization_is_pure() {
        let inputs = emi_loan(87_654.32, 97, 7.25);
        assert_eq!(amortize(&inputs), amortize(&inputs));
    }

    #[test]
    fn high_rate_over_long_term_stays_finite() {
        // (1 + r)^n overflows; the instalment degrades to pure interest
        let result = amortize(&emi_loan(100_000.0, 9_000, 100.0));
        assert_eq!(result.schedule.len(), 9_000);
        assert_eq!(result.summary.payment, 8_333.33);
        let last = result.schedule.last().expect("schedule must not be empty");
        assert_eq!(last.balance_after, 0.0);
        assert_eq!(last.principal_payment, 100_000.0);
        assert!(result.summary.total_paid.is_finite());
    }

    #[test]
    fn emi_exponent_does_not_wrap_for_huge_terms() {
        let months = i32::MAX as u32 + 2;
        assert_approx_tol(emi_payment(1_000.0, months, 0.01), 10.0, 1e-9);
        assert_approx_tol(emi_payment(1_000.0, 4, 1e-18), 250.0, 1e-9);
    }

    #[test]
    fn overflowing_rate_returns_empty_schedule() {
        let result = amortize(&emi_loan(100_000.0, 12, 1e308));
        assert!(result.schedule.is_empty());
        assert_eq!(result.summary, LoanSummary::default());

        let interest_only = amortize(&LoanInputs {
            amount: f64::MAX,
            months: 3,
            annual_rate: 50.0,
            loan_type: LoanType::InterestOnly,
        });
        assert!(interest_only.schedule.is_empty());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_outputs_are_finite_for_extreme_terms(
            amount_cents in 1u64..1_000_000_000_000,
            months in 1u32..=MAX_LOAN_MONTHS,
            rate_pct in 0u32..=5_000,
            interest_only in proptest::bool::ANY,
        ) {
            let inputs = LoanInputs {
                amount: amount_cents as f64 / 100.0,
                months,
                annual_rate: rate_pct as f64,
                loan_type: if interest_only { LoanType::InterestOnly } else { LoanType::Emi },
            };
            let result = amortize(&inputs);
            prop_assert!(result.schedule.len() == months as usize);
            for e in &result.schedule {
                prop_assert!(e.interest_payment.is_finite() && e.principal_payment.is_finite());
                prop_assert!(e.total_payment.is_finite() && e.balance_after.is_finite());
                prop_assert!(e.cumulative_interest.is_finite() && e.cumulative_principal.is_finite());
            }
            prop_assert!(result.summary.payment.is_finite());
            prop_assert!(result.summary.total_paid.is_finite());
            prop_assert_eq!(result.schedule.last().map(|e| e.balance_after), Some(0.0));
        }

        #[test]
        fn prop_emi_schedule_ends_at_zero(
            amount_cents in 100u64..100_000_000,
            months in 1u32..480,
            rate_bp in 0u32..2500,
        ) {
            let amount = amount_cents as f64 / 100.0;
            let result = amortize(&emi_loan(amount, months, rate_bp as f64 / 100.0));
            prop_assert!(result.schedule.len() == months as usize);
            let last = result.schedule.last().expect("non-empty");
            prop_assert!(last.balance_after.abs() <= 0.01);
            let principal: f64 = result.schedule.iter().map(|e| e.principal_payment).sum();
            prop_assert!((principal - amount).abs() <= 0.01 + amount * 1e-12);
            prop_assert!(result.schedule.iter().all(|e| e.principal_payment >= 0.0));
            prop_assert!(result.schedule.iter().all(|e| e.balance_after >= 0.0));
        }
    }
}
