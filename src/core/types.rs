use serde::{Deserialize, Serialize};

use super::numeric::non_negative;

/// Trading days per year used to de-annualize volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One line of a portfolio mix: weight in percent points, sigma as a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetWeight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub sigma: f64,
}

impl AssetWeight {
    pub fn new(weight: f64, sigma: f64) -> Self {
        Self {
            name: None,
            weight,
            sigma,
        }
    }

    pub fn named(name: impl Into<String>, weight: f64, sigma: f64) -> Self {
        Self {
            name: Some(name.into()),
            weight,
            sigma,
        }
    }

    /// Weight as a fraction of the portfolio, coerced to a non-negative finite value.
    pub fn weight_fraction(&self) -> f64 {
        non_negative(self.weight) / 100.0
    }

    /// Annualized sigma, coerced to a non-negative finite value.
    pub fn annual_sigma(&self) -> f64 {
        non_negative(self.sigma)
    }
}

/// The asset mix shared by the VaR engine and the distribution sampler.
///
/// Assets are treated as uncorrelated, so the portfolio variance is the sum of
/// each asset's weighted variance. Weights are not required to sum to 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioMix {
    pub assets: Vec<AssetWeight>,
}

impl PortfolioMix {
    pub fn new(assets: Vec<AssetWeight>) -> Self {
        Self { assets }
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn annual_sigma(&self) -> f64 {
        self.assets
            .iter()
            .map(|a| (a.weight_fraction() * a.annual_sigma()).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    pub fn daily_sigma(&self) -> f64 {
        self.annual_sigma() / TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Square-root-of-time scaling of the daily sigma.
    pub fn horizon_sigma(&self, horizon_days: u32) -> f64 {
        self.daily_sigma() * (horizon_days as f64).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarResult {
    pub var_value: f64,
    pub var_percent: f64,
    pub sigma_annual: f64,
    pub sigma_horizon: f64,
}

/// Cumulative portfolio return over one rolling window, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowReturn {
    pub window: u32,
    #[serde(rename = "return")]
    pub return_pct: f64,
}

/// Histogram bin keyed by its left edge, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub bucket: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub simulations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub samples: Vec<WindowReturn>,
    pub stats: DistributionStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub stats: DistributionStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Distribution {
    RollingWindow(Heatmap),
    Histogram(Histogram),
}

impl Distribution {
    pub fn stats(&self) -> DistributionStats {
        match self {
            Distribution::RollingWindow(h) => h.stats,
            Distribution::Histogram(h) => h.stats,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    #[serde(alias = "EMI", alias = "amortized")]
    Emi,
    #[serde(alias = "interest-only", alias = "interestOnly")]
    InterestOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct LoanInputs {
    pub amount: f64,
    pub months: u32,
    /// Annual rate in percent, e.g. 6.5.
    pub annual_rate: f64,
    pub loan_type: LoanType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationEntry {
    pub month: u32,
    pub interest_payment: f64,
    pub principal_payment: f64,
    pub total_payment: f64,
    pub balance_after: f64,
    pub cumulative_interest: f64,
    pub cumulative_principal: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_paid: f64,
    /// The standard per-period payment (EMI, or the interest-only coupon).
    pub payment: f64,
    pub periods: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationResult {
    pub schedule: Vec<AmortizationEntry>,
    pub summary: LoanSummary,
}

/// Rates are fractions, e.g. 0.03 for 3%.
#[derive(Debug, Clone, Copy)]
pub struct BuyVsRentInputs {
    pub home_price: f64,
    pub monthly_rent: f64,
    pub appreciation_rate: f64,
    pub maintenance_rate: f64,
    pub investment_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyNetWorthEntry {
    pub year: u32,
    pub owning_net_worth: f64,
    pub renting_net_worth: f64,
    pub difference: f64,
    pub annual_rent: f64,
    /// Maintenance paid during this year.
    pub maintenance_cost: f64,
    pub cumulative_maintenance: f64,
    pub property_value: f64,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyVsRentResult {
    pub schedule: Vec<YearlyNetWorthEntry>,
    pub break_even_year: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct DownPaymentInputs {
    pub property_cost: f64,
    /// Loan-to-value as a fraction; the down payment covers `1 - desired_ltv`.
    pub desired_ltv: f64,
    pub monthly_savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsEntry {
    pub month: u32,
    pub total_saved: f64,
    pub pace: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownPaymentResult {
    pub schedule: Vec<SavingsEntry>,
    pub target_amount: f64,
    pub months_needed: Option<u32>,
}

/// Rates are fractions. `swr` and `reinvestment` are fractions of the portfolio
/// and of the withdrawal respectively.
#[derive(Debug, Clone, Copy)]
pub struct FireInputs {
    pub annual_expenses: f64,
    pub inflation_rate: f64,
    pub expected_return: f64,
    pub terminal_age: u32,
    pub current_age: u32,
    pub swr: f64,
    pub reinvestment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireProjectionEntry {
    pub age: u32,
    pub portfolio: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireResult {
    pub fire_number: f64,
    pub future_expenses: f64,
    pub effective_withdrawal_rate: f64,
    pub perpetual_estimate: f64,
    pub finite_horizon_estimate: f64,
    pub years: u32,
    pub series: Vec<FireProjectionEntry>,
}
