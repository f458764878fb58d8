//! Bids and transaction records exchanged between households, the two
//! markets and the statistics collectors.

use crate::types::{HouseId, HouseholdId};
use serde::{Deserialize, Serialize};

/// What a purchase is for. Selects the bank's loan-to-value ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MortgageKind {
    FirstTimeBuyer,
    HomeMover,
    BuyToLet,
}

impl MortgageKind {
    pub fn is_btl(self) -> bool {
        matches!(self, Self::BuyToLet)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleBid {
    pub bidder: HouseholdId,
    /// Highest price the bidder will pay.
    pub price: f64,
    pub kind: MortgageKind,
    /// Cash the bidder puts down.
    pub down_payment: f64,
    /// Rent the bidder expects the house to earn. Zero for owner-occupiers.
    pub expected_monthly_rent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalBid {
    pub bidder: HouseholdId,
    /// Highest monthly rent the bidder will pay.
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub house: HouseId,
    pub quality: usize,
    pub price: f64,
    pub buyer: HouseholdId,
    pub seller: Option<HouseholdId>,
    pub kind: MortgageKind,
    pub months_on_market: u64,
    pub new_build: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetRecord {
    pub house: HouseId,
    pub quality: usize,
    pub monthly_rent: f64,
    pub tenant: HouseholdId,
    pub landlord: HouseholdId,
    pub months_on_market: u64,
}

/// Annuity payment per unit of principal.
pub fn monthly_payment_factor(annual_rate: f64, term_months: u32) -> f64 {
    let r = annual_rate / 12.0;
    let n = term_months.max(1) as f64;
    if r.abs() < 1e-12 {
        return 1.0 / n;
    }
    r / (1.0 - (1.0 + r).powf(-n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_annuity_is_straight_line() {
        assert!((monthly_payment_factor(0.0, 300) - 1.0 / 300.0).abs() < 1e-15);
    }

    #[test]
    fn annuity_repays_more_than_principal() {
        let f = monthly_payment_factor(0.05, 300);
        assert!(f * 300.0 > 1.0);
        assert!(f < 0.01);
    }
}
