use tracing::debug;

use super::numeric::{finite_or_zero, round2};
use super::types::{BuyVsRentInputs, BuyVsRentResult, YearlyNetWorthEntry};

pub const BUY_VS_RENT_YEARS: u32 = 35;

/// Compares owning a home against renting and investing the purchase price.
///
/// The renter starts with a portfolio equal to `home_price`, grows it by the
/// investment return each year and then pays a year of rent out of it. The
/// owner holds an appreciating property and pays maintenance on its current
/// value. The break-even year is the first year owning is worth at least as
/// much as renting.
///
/// Rates large enough to overflow `f64` within the horizon produce an empty
/// schedule.
pub fn model_buy_vs_rent(inputs: &BuyVsRentInputs) -> BuyVsRentResult {
    let home_price = finite_or_zero(inputs.home_price);
    let monthly_rent = finite_or_zero(inputs.monthly_rent);
    if home_price <= 0.0 || monthly_rent <= 0.0 {
        debug!(home_price, monthly_rent, "degenerate buy-vs-rent inputs");
        return empty_result();
    }

    let appreciation = finite_or_zero(inputs.appreciation_rate);
    let maintenance_rate = finite_or_zero(inputs.maintenance_rate);
    let investment_return = finite_or_zero(inputs.investment_return);
    let annual_rent = monthly_rent * 12.0;

    let mut property_value = home_price;
    let mut cumulative_maintenance = 0.0;
    let mut portfolio = home_price;
    let mut break_even_year = None;
    let mut schedule = Vec::with_capacity(BUY_VS_RENT_YEARS as usize);

    for year in 1..=BUY_VS_RENT_YEARS {
        property_value *= 1.0 + appreciation;
        let maintenance = property_value * maintenance_rate;
        cumulative_maintenance += maintenance;
        let owning = property_value - cumulative_maintenance;

        portfolio = (portfolio * (1.0 + investment_return) - annual_rent).max(0.0);
        let renting = portfolio;

        if break_even_year.is_none() && owning >= renting {
            break_even_year = Some(year);
        }

        schedule.push(YearlyNetWorthEntry {
            year,
            owning_net_worth: round2(owning),
            renting_net_worth: round2(renting),
            difference: round2(owning - renting),
            annual_rent: round2(annual_rent),
            maintenance_cost: round2(maintenance),
            cumulative_maintenance: round2(cumulative_maintenance),
            property_value: round2(property_value),
            portfolio_value: round2(portfolio),
        });
    }

    if !schedule.iter().all(is_finite_entry) {
        debug!(appreciation, investment_return, "buy-vs-rent figures overflow");
        return empty_result();
    }

    BuyVsRentResult {
        schedule,
        break_even_year,
    }
}

fn empty_result() -> BuyVsRentResult {
    BuyVsRentResult {
        schedule: Vec::new(),
        break_even_year: None,
    }
}

fn is_finite_entry(entry: &YearlyNetWorthEntry) -> bool {
    [
        entry.owning_net_worth,
        entry.renting_net_worth,
        entry.difference,
        entry.annual_rent,
        entry.maintenance_cost,
        entry.cumulative_maintenance,
        entry.property_value,
        entry.portfolio_value,
    ]
    .iter()
    .all(|v| v.is_finite())
}
