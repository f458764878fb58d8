//! Macro indicators the central bank watches. Recomputed in phase 13
//! from the collectors updated earlier in the same tick.

use crate::{
    credit_supply::CreditSupply, household_stats::HouseholdStats,
    housing_market_stats::HousingMarketStats, subsystem::Bank,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreIndicators {
    pub debt_to_income: f64,
    pub oo_debt_to_income: f64,
    pub dti_borrowers: f64,
    pub oo_lti: f64,
    pub oo_ltv: f64,
    pub btl_ltv: f64,
    pub mortgage_approvals: u32,
    pub price_to_income: f64,
    pub rental_yield: f64,
    pub interest_rate_spread: f64,
}

impl CoreIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        *self = Self::default();
    }

    pub fn update(
        &mut self,
        households: &HouseholdStats,
        housing: &HousingMarketStats,
        credit: &CreditSupply,
        bank: &dyn Bank,
    ) {
        let all_income = households.all_annualised_total_income();
        let population = households.population();
        let mean_income = if population > 0 { all_income / population as f64 } else { 0.0 };

        *self = Self {
            debt_to_income: ratio(credit.total_credit(), all_income),
            oo_debt_to_income: ratio(
                credit.total_oo_credit(),
                households.owner_occupier_annualised_total_income(),
            ),
            dti_borrowers: ratio(credit.total_credit(), credit.borrower_annual_income()),
            oo_lti: credit.mean_oo_lti(),
            oo_ltv: credit.mean_oo_ltv(),
            btl_ltv: credit.mean_btl_ltv(),
            mortgage_approvals: credit.mortgage_approvals(),
            price_to_income: ratio(housing.mean_exp_av_sale_price(), mean_income),
            rental_yield: households.av_stock_yield(),
            interest_rate_spread: bank.interest_rate_spread(),
        };
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}
