//! Mortgage bookkeeping.
//!
//! New mortgages are reported by the sale market while it clears (phase 5)
//! into an accumulating window. `record()` (phase 11) publishes that window
//! and recomputes the outstanding-credit totals from the live population.
//! Readers see the published values until the next `record()`.

use crate::{
    household::Household,
    market::MortgageKind,
    subsystem::MortgageApproval,
    types::{quality_quartile, N_QUARTILES},
};

/// New lending within one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MortgageFlows {
    pub n_approvals: u32,
    pub n_ftb: u32,
    pub n_btl: u32,
    pub oo_credit: f64,
    pub btl_credit: f64,
    pub sum_down_payment: f64,
    pub n_oo: u32,
    pub sum_oo_ltv: f64,
    pub sum_oo_lti: f64,
    pub sum_btl_ltv: f64,
    pub quartile_principal: [f64; N_QUARTILES],
    pub quartile_installment: [f64; N_QUARTILES],
    pub quartile_count: [u32; N_QUARTILES],
}

impl MortgageFlows {
    pub fn new_credit(&self) -> f64 {
        self.oo_credit + self.btl_credit
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreditSupply {
    n_quality: usize,
    pending: MortgageFlows,
    published: MortgageFlows,

    n_registered_mortgages: u32,
    total_oo_credit: f64,
    total_btl_credit: f64,
    borrower_annual_income: f64,
    oo_dsr: f64,
    btl_dsr: f64,
}

impl CreditSupply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, n_quality: usize) {
        *self = Self {
            n_quality,
            ..Self::default()
        };
    }

    pub fn record_new_mortgage(
        &mut self,
        kind: MortgageKind,
        quality: usize,
        price: f64,
        approval: &MortgageApproval,
        annual_income: f64,
    ) {
        let f = &mut self.pending;
        f.n_approvals += 1;
        f.sum_down_payment += approval.down_payment;
        let ltv = if price > 0.0 { approval.principal / price } else { 0.0 };
        match kind {
            MortgageKind::BuyToLet => {
                f.n_btl += 1;
                f.btl_credit += approval.principal;
                f.sum_btl_ltv += ltv;
            }
            MortgageKind::FirstTimeBuyer | MortgageKind::HomeMover => {
                if kind == MortgageKind::FirstTimeBuyer {
                    f.n_ftb += 1;
                }
                f.n_oo += 1;
                f.oo_credit += approval.principal;
                f.sum_oo_ltv += ltv;
                if annual_income > 0.0 {
                    f.sum_oo_lti += approval.principal / annual_income;
                }
            }
        }
        let q = quality_quartile(quality, self.n_quality) - 1;
        f.quartile_principal[q] += approval.principal;
        f.quartile_installment[q] += approval.monthly_payment;
        f.quartile_count[q] += 1;
    }

    /// Publish this tick's new lending and recompute outstanding totals.
    pub fn record<'a>(&mut self, households: impl IntoIterator<Item = &'a Household>) {
        self.published = std::mem::take(&mut self.pending);

        let mut n_registered = 0u32;
        let mut oo_credit = 0.0;
        let mut btl_credit = 0.0;
        let mut borrower_income = 0.0;
        let (mut oo_payments, mut oo_income) = (0.0, 0.0);
        let (mut btl_payments, mut btl_income) = (0.0, 0.0);

        for h in households {
            if h.mortgages.is_empty() {
                continue;
            }
            let monthly_income = h.monthly_gross_income();
            borrower_income += h.annual_gross_income;
            let mut has_oo = false;
            let mut has_btl = false;
            for m in &h.mortgages {
                n_registered += 1;
                if m.btl {
                    btl_credit += m.principal;
                    btl_payments += m.monthly_payment;
                    has_btl = true;
                } else {
                    oo_credit += m.principal;
                    oo_payments += m.monthly_payment;
                    has_oo = true;
                }
            }
            if has_oo {
                oo_income += monthly_income;
            }
            if has_btl {
                btl_income += monthly_income;
            }
        }

        self.n_registered_mortgages = n_registered;
        self.total_oo_credit = oo_credit;
        self.total_btl_credit = btl_credit;
        self.borrower_annual_income = borrower_income;
        self.oo_dsr = ratio(oo_payments, oo_income);
        self.btl_dsr = ratio(btl_payments, btl_income);
    }

    pub fn flows(&self) -> &MortgageFlows {
        &self.published
    }

    pub fn mortgage_approvals(&self) -> u32 {
        self.published.n_approvals
    }

    pub fn n_ftb_mortgages(&self) -> u32 {
        self.published.n_ftb
    }

    pub fn n_btl_mortgages(&self) -> u32 {
        self.published.n_btl
    }

    pub fn new_credit(&self) -> f64 {
        self.published.new_credit()
    }

    pub fn n_registered_mortgages(&self) -> u32 {
        self.n_registered_mortgages
    }

    pub fn total_oo_credit(&self) -> f64 {
        self.total_oo_credit
    }

    pub fn total_btl_credit(&self) -> f64 {
        self.total_btl_credit
    }

    pub fn total_credit(&self) -> f64 {
        self.total_oo_credit + self.total_btl_credit
    }

    pub fn borrower_annual_income(&self) -> f64 {
        self.borrower_annual_income
    }

    pub fn oo_dsr(&self) -> f64 {
        self.oo_dsr
    }

    pub fn btl_dsr(&self) -> f64 {
        self.btl_dsr
    }

    pub fn avg_downpayment(&self) -> f64 {
        ratio(self.published.sum_down_payment, self.published.n_approvals as f64)
    }

    pub fn mean_oo_ltv(&self) -> f64 {
        ratio(self.published.sum_oo_ltv, self.published.n_oo as f64)
    }

    pub fn mean_oo_lti(&self) -> f64 {
        ratio(self.published.sum_oo_lti, self.published.n_oo as f64)
    }

    pub fn mean_btl_ltv(&self) -> f64 {
        ratio(self.published.sum_btl_ltv, self.published.n_btl as f64)
    }

    /// Average principal of this tick's new mortgages in a 1-based quartile.
    pub fn quartile_principal(&self, quartile: usize) -> f64 {
        let f = &self.published;
        ratio(f.quartile_principal[quartile - 1], f.quartile_count[quartile - 1] as f64)
    }

    pub fn quartile_installment(&self, quartile: usize) -> f64 {
        let f = &self.published;
        ratio(f.quartile_installment[quartile - 1], f.quartile_count[quartile - 1] as f64)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approval(principal: f64) -> MortgageApproval {
        MortgageApproval {
            principal,
            monthly_payment: principal / 300.0,
            down_payment: 10_000.0,
            term_months: 300,
        }
    }

    #[test]
    fn flows_publish_on_record() {
        let mut credit = CreditSupply::new();
        credit.init(16);
        credit.record_new_mortgage(MortgageKind::FirstTimeBuyer, 0, 100_000.0, &approval(90_000.0), 30_000.0);
        assert_eq!(credit.mortgage_approvals(), 0, "pending flows must not be visible");

        credit.record(std::iter::empty());
        assert_eq!(credit.mortgage_approvals(), 1);
        assert_eq!(credit.n_ftb_mortgages(), 1);
        assert!((credit.mean_oo_ltv() - 0.9).abs() < 1e-12);
        assert!((credit.mean_oo_lti() - 3.0).abs() < 1e-12);
        assert_eq!(credit.quartile_principal(1), 90_000.0);
        assert_eq!(credit.quartile_principal(4), 0.0);

        credit.record(std::iter::empty());
        assert_eq!(credit.mortgage_approvals(), 0);
    }
}
