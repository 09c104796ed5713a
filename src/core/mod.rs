mod buy_vs_rent;
mod distribution;
mod down_payment;
mod fire;
mod loan;
mod numeric;
mod rng;
mod types;
mod var;

pub use buy_vs_rent::{BUY_VS_RENT_YEARS, model_buy_vs_rent};
pub use distribution::{
    DEFAULT_BUCKETS, DEFAULT_SIMULATIONS, ROLLING_WINDOW_MAX_HORIZON, generate_heatmap,
    generate_histogram, sample_distribution, sample_distribution_with,
};
pub use down_payment::{DOWN_PAYMENT_MAX_MONTHS, project_down_payment};
pub use fire::{MAX_AGE, compute_fire};
pub use loan::{MAX_LOAN_MONTHS, amortize, emi_payment};
pub use numeric::{finite_or_zero, non_negative, round2};
pub use rng::{RandomSource, SeededRng};
pub use types::{
    AmortizationEntry, AmortizationResult, AssetWeight, BuyVsRentInputs, BuyVsRentResult,
    Distribution, DistributionStats, DownPaymentInputs, DownPaymentResult, FireInputs,
    FireProjectionEntry, FireResult, Heatmap, Histogram, HistogramBin, LoanInputs, LoanSummary,
    LoanType, PortfolioMix, SavingsEntry, TRADING_DAYS_PER_YEAR, VarResult, WindowReturn,
    YearlyNetWorthEntry,
};
pub use var::{ConfidenceLevel, calc_var};
