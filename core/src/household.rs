//! Household agents as seen by the statistics layer.
//!
//! The behaviour that moves these fields each tick lives in the
//! `HouseholdBehaviour` collaborator; this module only holds the data and
//! the classification rules.

use crate::types::{HouseId, HouseholdId, MONTHS_IN_YEAR};
use serde::{Deserialize, Serialize};

/// Where a household lives. Exactly one variant at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Occupancy {
    OwnerOccupier {
        home: HouseId,
        quality: usize,
    },
    Renting {
        home: HouseId,
        quality: usize,
        monthly_rent: f64,
        months_left: u32,
    },
    SocialHousing,
}

/// The six mutually exclusive categories used by `HouseholdStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HouseholdCategory {
    ActiveBtl,
    BtlOwnerOccupier,
    BtlHomeless,
    NonBtlOwnerOccupier,
    Renting,
    NonBtlHomeless,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mortgage {
    pub house: HouseId,
    pub principal: f64,
    pub monthly_payment: f64,
    pub months_left: u32,
    pub btl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub age: f64,
    pub income_percentile: f64,
    pub annual_gross_income: f64,
    pub bank_balance: f64,
    pub btl: bool,
    pub fundamentalist: bool,
    pub bankrupt: bool,
    pub was_bankrupt: bool,
    pub occupancy: Occupancy,
    /// Every house this household owns, its own home included.
    pub owned: Vec<HouseId>,
    pub mortgages: Vec<Mortgage>,
}

impl Household {
    pub fn new(
        id: HouseholdId,
        age: f64,
        income_percentile: f64,
        annual_gross_income: f64,
        bank_balance: f64,
        btl: bool,
        fundamentalist: bool,
    ) -> Self {
        Self {
            id,
            age,
            income_percentile,
            annual_gross_income,
            bank_balance,
            btl,
            fundamentalist,
            bankrupt: false,
            was_bankrupt: false,
            occupancy: Occupancy::SocialHousing,
            owned: Vec::new(),
            mortgages: Vec::new(),
        }
    }

    pub fn monthly_gross_income(&self) -> f64 {
        self.annual_gross_income / MONTHS_IN_YEAR
    }

    pub fn is_homeowner(&self) -> bool {
        matches!(self.occupancy, Occupancy::OwnerOccupier { .. })
    }

    pub fn is_renting(&self) -> bool {
        matches!(self.occupancy, Occupancy::Renting { .. })
    }

    pub fn is_in_social_housing(&self) -> bool {
        matches!(self.occupancy, Occupancy::SocialHousing)
    }

    pub fn home(&self) -> Option<HouseId> {
        match self.occupancy {
            Occupancy::OwnerOccupier { home, .. } | Occupancy::Renting { home, .. } => Some(home),
            Occupancy::SocialHousing => None,
        }
    }

    /// Houses owned beyond the household's own home.
    /// Negative (-1) when the household owns nothing and has no home of
    /// its own.
    pub fn n_investment_properties(&self) -> i32 {
        let owned = self.owned.len() as i32;
        match self.occupancy {
            Occupancy::OwnerOccupier { .. } => owned - 1,
            _ if owned == 0 => -1,
            _ => owned,
        }
    }

    /// Owned houses other than the home the household lives in.
    pub fn investment_houses(&self) -> impl Iterator<Item = HouseId> + '_ {
        let home = match self.occupancy {
            Occupancy::OwnerOccupier { home, .. } => Some(home),
            _ => None,
        };
        self.owned.iter().copied().filter(move |h| Some(*h) != home)
    }

    pub fn mortgage_for(&self, house: HouseId) -> Option<&Mortgage> {
        self.mortgages.iter().find(|m| m.house == house)
    }

    pub fn total_debt(&self) -> f64 {
        self.mortgages.iter().map(|m| m.principal).sum()
    }

    pub fn newly_bankrupt(&self) -> bool {
        self.bankrupt && !self.was_bankrupt
    }

    /// Classify into exactly one category. BTL households are split by
    /// investment property count; everyone else by occupancy.
    pub fn category(&self) -> HouseholdCategory {
        if self.btl {
            match self.n_investment_properties() {
                n if n > 0 => HouseholdCategory::ActiveBtl,
                0 => HouseholdCategory::BtlOwnerOccupier,
                _ => HouseholdCategory::BtlHomeless,
            }
        } else {
            match self.occupancy {
                Occupancy::OwnerOccupier { .. } => HouseholdCategory::NonBtlOwnerOccupier,
                Occupancy::Renting { .. } => HouseholdCategory::Renting,
                Occupancy::SocialHousing => HouseholdCategory::NonBtlHomeless,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household(btl: bool) -> Household {
        Household::new(1, 40.0, 0.5, 30_000.0, 1_000.0, btl, false)
    }

    #[test]
    fn btl_precedence_follows_property_count() {
        let mut h = household(true);
        assert_eq!(h.category(), HouseholdCategory::BtlHomeless);

        h.occupancy = Occupancy::OwnerOccupier { home: 3, quality: 1 };
        h.owned = vec![3];
        assert_eq!(h.category(), HouseholdCategory::BtlOwnerOccupier);

        h.owned.push(7);
        assert_eq!(h.n_investment_properties(), 1);
        assert_eq!(h.category(), HouseholdCategory::ActiveBtl);
        assert_eq!(h.investment_houses().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn non_btl_classified_by_occupancy() {
        let mut h = household(false);
        assert_eq!(h.category(), HouseholdCategory::NonBtlHomeless);
        h.occupancy = Occupancy::Renting {
            home: 2,
            quality: 0,
            monthly_rent: 500.0,
            months_left: 12,
        };
        assert_eq!(h.category(), HouseholdCategory::Renting);
        h.occupancy = Occupancy::OwnerOccupier { home: 2, quality: 0 };
        assert_eq!(h.category(), HouseholdCategory::NonBtlOwnerOccupier);
    }
}
