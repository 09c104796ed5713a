use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use crate::api::run_http_server;
use crate::core::{
    AssetWeight, BuyVsRentInputs, ConfidenceLevel, DEFAULT_BUCKETS, DEFAULT_SIMULATIONS,
    DownPaymentInputs, FireInputs, LoanInputs, LoanType, MAX_AGE, MAX_LOAN_MONTHS, PortfolioMix,
    SeededRng, amortize, calc_var, compute_fire, model_buy_vs_rent, project_down_payment,
    sample_distribution_with,
};
use crate::error::CalcError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not encode result: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "fincalc",
    about = "Personal-finance calculators: VaR, loans, buy vs rent, down payment, FIRE"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculators over HTTP
    Serve {
        #[arg(long, env = "FINCALC_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Parametric value-at-risk for an asset mix
    Var(VarArgs),
    /// Sample the return distribution of an asset mix
    Distribution(DistributionArgs),
    /// Loan amortization schedule
    Loan(LoanArgs),
    /// Net worth of buying vs renting over 35 years
    BuyVsRent(BuyVsRentArgs),
    /// Months of saving needed for a down payment
    DownPayment(DownPaymentArgs),
    /// Portfolio size needed for financial independence
    Fire(FireArgs),
}

#[derive(Args, Debug)]
pub struct VarArgs {
    #[arg(
        long = "asset",
        value_parser = parse_asset,
        help = "Asset as [NAME=]WEIGHT:SIGMA, both in percent, e.g. stocks=60:15; repeatable"
    )]
    pub assets: Vec<AssetWeight>,
    #[arg(long, default_value_t = 1)]
    pub horizon_days: u32,
    #[arg(long, default_value_t = 95.0, help = "Confidence level in percent: 95 or 99")]
    pub confidence: f64,
    #[arg(long)]
    pub portfolio_value: f64,
}

#[derive(Args, Debug)]
pub struct DistributionArgs {
    #[arg(
        long = "asset",
        value_parser = parse_asset,
        help = "Asset as [NAME=]WEIGHT:SIGMA, both in percent; repeatable"
    )]
    pub assets: Vec<AssetWeight>,
    #[arg(long, default_value_t = 1)]
    pub horizon_days: u32,
    #[arg(long, help = "Seed for reproducible sampling; defaults to the clock")]
    pub seed: Option<u64>,
    #[arg(long, default_value_t = DEFAULT_BUCKETS, help = "Histogram bins for horizons over 5 days")]
    pub buckets: usize,
    #[arg(long, default_value_t = DEFAULT_SIMULATIONS, help = "Histogram draws for horizons over 5 days")]
    pub simulations: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliLoanType {
    Emi,
    InterestOnly,
}

impl From<CliLoanType> for LoanType {
    fn from(value: CliLoanType) -> Self {
        match value {
            CliLoanType::Emi => LoanType::Emi,
            CliLoanType::InterestOnly => LoanType::InterestOnly,
        }
    }
}

#[derive(Args, Debug)]
pub struct LoanArgs {
    #[arg(long)]
    pub amount: f64,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_LOAN_MONTHS as i64))]
    pub months: u32,
    #[arg(long, help = "Annual interest rate in percent, e.g. 6.5")]
    pub annual_rate: f64,
    #[arg(long, value_enum, default_value_t = CliLoanType::Emi)]
    pub loan_type: CliLoanType,
}

#[derive(Args, Debug)]
pub struct BuyVsRentArgs {
    #[arg(long)]
    pub home_price: f64,
    #[arg(long)]
    pub monthly_rent: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual home appreciation in percent")]
    pub appreciation_rate: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Annual maintenance as percent of property value"
    )]
    pub maintenance_rate: f64,
    #[arg(long, default_value_t = 5.0, help = "Annual investment return in percent")]
    pub investment_return: f64,
}

#[derive(Args, Debug)]
pub struct DownPaymentArgs {
    #[arg(long)]
    pub property_cost: f64,
    #[arg(long, default_value_t = 80.0, help = "Desired loan-to-value in percent")]
    pub desired_ltv: f64,
    #[arg(long)]
    pub monthly_savings: f64,
}

#[derive(Args, Debug)]
pub struct FireArgs {
    #[arg(long)]
    pub annual_expenses: f64,
    #[arg(long, default_value_t = 2.5, help = "Expected annual inflation in percent")]
    pub inflation_rate: f64,
    #[arg(long, default_value_t = 7.0, help = "Expected nominal return in percent")]
    pub expected_return: f64,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_AGE as i64))]
    pub current_age: u32,
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(0..=MAX_AGE as i64),
        help = "Age by which the portfolio must be in place"
    )]
    pub terminal_age: u32,
    #[arg(long, default_value_t = 4.0, help = "Safe withdrawal rate in percent")]
    pub swr: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Share of each withdrawal reinvested, in percent"
    )]
    pub reinvestment: f64,
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { port } => run_http_server(port).await?,
        Command::Var(args) => {
            let confidence = ConfidenceLevel::try_from(args.confidence)?;
            let mix = PortfolioMix::new(args.assets);
            print_json(&calc_var(
                &mix,
                args.horizon_days,
                confidence,
                args.portfolio_value,
            ))?;
        }
        Command::Distribution(args) => {
            let mut rng = match args.seed {
                Some(seed) => SeededRng::new(seed),
                None => SeededRng::from_time(),
            };
            let mix = PortfolioMix::new(args.assets);
            print_json(&sample_distribution_with(
                &mix,
                args.horizon_days,
                args.buckets,
                args.simulations,
                &mut rng,
            ))?;
        }
        Command::Loan(args) => print_json(&amortize(&loan_inputs(&args)))?,
        Command::BuyVsRent(args) => print_json(&model_buy_vs_rent(&buy_vs_rent_inputs(&args)))?,
        Command::DownPayment(args) => {
            print_json(&project_down_payment(&down_payment_inputs(&args)))?
        }
        Command::Fire(args) => print_json(&compute_fire(&fire_inputs(&args)))?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses `[NAME=]WEIGHT:SIGMA` with both numbers in percent.
fn parse_asset(raw: &str) -> Result<AssetWeight, String> {
    let (name, pair) = match raw.split_once('=') {
        Some((name, pair)) => (Some(name.trim().to_string()), pair),
        None => (None, raw),
    };
    let (weight, sigma) = pair
        .split_once(':')
        .ok_or_else(|| format!("asset '{raw}' must look like [NAME=]WEIGHT:SIGMA"))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid weight in '{raw}': {e}"))?;
    let sigma = sigma
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid sigma in '{raw}': {e}"))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(format!("weight in '{raw}' must be >= 0"));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(format!("sigma in '{raw}' must be >= 0"));
    }

    Ok(AssetWeight {
        name: name.filter(|n| !n.is_empty()),
        weight,
        sigma: sigma / 100.0,
    })
}

fn loan_inputs(args: &LoanArgs) -> LoanInputs {
    LoanInputs {
        amount: args.amount,
        months: args.months,
        annual_rate: args.annual_rate,
        loan_type: args.loan_type.into(),
    }
}

fn buy_vs_rent_inputs(args: &BuyVsRentArgs) -> BuyVsRentInputs {
    BuyVsRentInputs {
        home_price: args.home_price,
        monthly_rent: args.monthly_rent,
        appreciation_rate: args.appreciation_rate / 100.0,
        maintenance_rate: args.maintenance_rate / 100.0,
        investment_return: args.investment_return / 100.0,
    }
}

fn down_payment_inputs(args: &DownPaymentArgs) -> DownPaymentInputs {
    DownPaymentInputs {
        property_cost: args.property_cost,
        desired_ltv: args.desired_ltv / 100.0,
        monthly_savings: args.monthly_savings,
    }
}

fn fire_inputs(args: &FireArgs) -> FireInputs {
    FireInputs {
        annual_expenses: args.annual_expenses,
        inflation_rate: args.inflation_rate / 100.0,
        expected_return: args.expected_return / 100.0,
        terminal_age: args.terminal_age,
        current_age: args.current_age,
        swr: args.swr / 100.0,
        reinvestment: args.reinvestment / 100.0,
    }
}
