//! Baseline mortgage lender.
//!
//! Loans are capped three ways: loan-to-value per mortgage kind,
//! loan-to-income for owner-occupiers, and affordability (payment as a
//! share of income) or interest cover (BTL). The mortgage rate is the base
//! rate plus a spread that moves each month toward the credit supply
//! target.

use crate::{
    config::SimConfig,
    credit_supply::CreditSupply,
    household::Household,
    market::{monthly_payment_factor, MortgageKind},
    subsystem::{Bank, MortgageApproval, Policy},
};

#[derive(Debug, Clone, Default)]
pub struct BaselineBank {
    base_rate: f64,
    spread: f64,
    min_spread: f64,
    max_spread: f64,
    spread_adjustment: f64,
    credit_supply_target: f64,
    term_months: u32,
    max_ftb_ltv: f64,
    max_home_mover_ltv: f64,
    max_btl_ltv: f64,
    max_oo_lti: f64,
    affordability_coeff: f64,
    btl_icr: f64,
    supply_val: f64,
}

impl BaselineBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn payment_factor(&self) -> f64 {
        monthly_payment_factor(self.mortgage_rate(), self.term_months)
    }

    /// Largest principal the borrower's income supports.
    fn income_loan_cap(&self, household: &Household, kind: MortgageKind, expected_monthly_rent: f64) -> f64 {
        let factor = self.payment_factor();
        match kind {
            MortgageKind::BuyToLet => {
                if expected_monthly_rent > 0.0 {
                    expected_monthly_rent / (self.btl_icr * factor)
                } else {
                    0.0
                }
            }
            MortgageKind::FirstTimeBuyer | MortgageKind::HomeMover => {
                let lti_cap = self.max_oo_lti * household.annual_gross_income;
                let afford_cap = self.affordability_coeff * household.monthly_gross_income() / factor;
                lti_cap.min(afford_cap)
            }
        }
    }
}

impl Bank for BaselineBank {
    fn init(&mut self, config: &SimConfig) {
        let b = &config.bank;
        *self = Self {
            base_rate: b.base_rate,
            spread: b.initial_spread,
            min_spread: b.min_spread,
            max_spread: b.max_spread,
            spread_adjustment: b.spread_adjustment,
            credit_supply_target: b.credit_supply_target,
            term_months: config.derived.mortgage_term_months,
            max_ftb_ltv: b.max_ftb_ltv,
            max_home_mover_ltv: b.max_home_mover_ltv,
            max_btl_ltv: b.max_btl_ltv,
            max_oo_lti: b.max_oo_lti,
            affordability_coeff: b.affordability_coeff,
            btl_icr: b.btl_icr,
            supply_val: 0.0,
        };
    }

    fn mortgage_rate(&self) -> f64 {
        self.base_rate + self.spread
    }

    fn interest_rate_spread(&self) -> f64 {
        self.spread
    }

    fn max_ltv(&self, kind: MortgageKind) -> f64 {
        match kind {
            MortgageKind::FirstTimeBuyer => self.max_ftb_ltv,
            MortgageKind::HomeMover => self.max_home_mover_ltv,
            MortgageKind::BuyToLet => self.max_btl_ltv,
        }
    }

    fn max_oo_lti(&self) -> f64 {
        self.max_oo_lti
    }

    fn max_purchase_price(
        &self,
        household: &Household,
        kind: MortgageKind,
        down_payment: f64,
        expected_monthly_rent: f64,
    ) -> f64 {
        let down_payment = down_payment.max(0.0);
        let ltv = self.max_ltv(kind);
        let ltv_cap = if ltv < 1.0 { down_payment / (1.0 - ltv) } else { f64::INFINITY };
        let income_cap = down_payment + self.income_loan_cap(household, kind, expected_monthly_rent);
        income_cap.min(ltv_cap)
    }

    fn request_approval(
        &mut self,
        household: &Household,
        kind: MortgageKind,
        price: f64,
        down_payment: f64,
        expected_monthly_rent: f64,
    ) -> Option<MortgageApproval> {
        let down_payment = down_payment.clamp(0.0, price);
        let principal = price - down_payment;
        if principal > self.max_ltv(kind) * price + 1e-6 {
            return None;
        }
        if principal > self.income_loan_cap(household, kind, expected_monthly_rent) + 1e-6 {
            return None;
        }
        Some(MortgageApproval {
            principal,
            monthly_payment: principal * self.payment_factor(),
            down_payment,
            term_months: self.term_months,
        })
    }

    fn set_all_ltv(&mut self, ftb: f64, home_mover: f64, btl: f64) {
        self.max_ftb_ltv = ftb;
        self.max_home_mover_ltv = home_mover;
        self.max_btl_ltv = btl;
        log::info!("Bank LTV caps set to ftb={ftb:.2} home_mover={home_mover:.2} btl={btl:.2}");
    }

    fn step(&mut self, n_households: usize, credit: &CreditSupply, policy: &Policy) {
        self.supply_val = self.credit_supply_target * n_households as f64;
        if self.supply_val > 0.0 {
            let excess = credit.new_credit() / self.supply_val - 1.0;
            self.spread = (self.spread + self.spread_adjustment * excess)
                .clamp(self.min_spread, self.max_spread);
        }
        self.max_oo_lti = policy.max_oo_lti;
    }

    fn supply_val(&self) -> f64 {
        self.supply_val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> BaselineBank {
        let mut bank = BaselineBank::new();
        bank.init(&SimConfig::default_test());
        bank
    }

    #[test]
    fn approval_respects_ltv_cap() {
        let mut bank = bank();
        let h = Household::new(1, 35.0, 0.9, 200_000.0, 50_000.0, false, false);
        let max = bank.max_purchase_price(&h, MortgageKind::FirstTimeBuyer, 10_000.0, 0.0);
        assert!((max - 10_000.0 / 0.05).abs() < 1e-6);
        assert!(bank.request_approval(&h, MortgageKind::FirstTimeBuyer, max, 10_000.0, 0.0).is_some());
        assert!(bank.request_approval(&h, MortgageKind::FirstTimeBuyer, max * 1.1, 10_000.0, 0.0).is_none());
    }

    #[test]
    fn btl_without_rent_is_cash_only() {
        let bank = bank();
        let h = Household::new(1, 50.0, 0.9, 80_000.0, 30_000.0, true, false);
        let max = bank.max_purchase_price(&h, MortgageKind::BuyToLet, 30_000.0, 0.0);
        assert!((max - 30_000.0).abs() < 1e-9);
    }

    #[test]
    fn spread_rises_when_credit_demand_exceeds_target() {
        let mut bank = bank();
        let before = bank.interest_rate_spread();
        let mut credit = CreditSupply::new();
        credit.init(16);
        let approval = MortgageApproval {
            principal: 1_000_000.0,
            monthly_payment: 5_000.0,
            down_payment: 0.0,
            term_months: 300,
        };
        credit.record_new_mortgage(MortgageKind::HomeMover, 3, 1_000_000.0, &approval, 100_000.0);
        credit.record(std::iter::empty());
        bank.step(100, &credit, &Policy { max_oo_lti: 4.5 });
        assert!(bank.interest_rate_spread() > before);
        assert_eq!(bank.supply_val(), 38_000.0);
    }
}
