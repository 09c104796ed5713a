use tracing::debug;

use super::numeric::non_negative;
use super::types::{PortfolioMix, VarResult};
use crate::error::{CalcError, CalcResult};

/// Supported one-tailed confidence tiers.
///
/// The z-scores are a fixed lookup rather than a normal quantile, so only these
/// two tiers exist. Anything else is rejected at parse time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfidenceLevel {
    P95,
    P99,
}

impl ConfidenceLevel {
    pub fn z_score(self) -> f64 {
        match self {
            ConfidenceLevel::P95 => 1.65,
            ConfidenceLevel::P99 => 2.33,
        }
    }

    pub fn as_fraction(self) -> f64 {
        match self {
            ConfidenceLevel::P95 => 0.95,
            ConfidenceLevel::P99 => 0.99,
        }
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = CalcError;

    /// Accepts fractions (0.95) or percent points (95).
    fn try_from(value: f64) -> CalcResult<Self> {
        const TOL: f64 = 1e-9;
        if (value - 0.95).abs() < TOL || (value - 95.0).abs() < TOL {
            Ok(ConfidenceLevel::P95)
        } else if (value - 0.99).abs() < TOL || (value - 99.0).abs() < TOL {
            Ok(ConfidenceLevel::P99)
        } else {
            Err(CalcError::UnsupportedConfidence(value))
        }
    }
}

/// Parametric VaR of `mix` over `horizon_days` at `confidence`.
///
/// `portfolio_value` that is negative or not finite is treated as 0, which
/// yields a zero VaR and a zero percentage.
pub fn calc_var(
    mix: &PortfolioMix,
    horizon_days: u32,
    confidence: ConfidenceLevel,
    portfolio_value: f64,
) -> VarResult {
    let portfolio_value = non_negative(portfolio_value);
    let sigma_annual = mix.annual_sigma();
    let sigma_horizon = mix.horizon_sigma(horizon_days);

    let var_value = confidence.z_score() * sigma_horizon * portfolio_value;
    let var_percent = if portfolio_value > 0.0 {
        var_value / portfolio_value * 100.0
    } else {
        debug!("portfolio value is zero, reporting VaR percent as 0");
        0.0
    };

    VarResult {
        var_value,
        var_percent,
        sigma_annual,
        sigma_horizon,
    }
}
