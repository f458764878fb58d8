//! Household statistics: the population classifier and aggregator.
//!
//! Once per tick `record()` reclassifies the entire live population into
//! six mutually exclusive categories and rebuilds the `HouseholdSnapshot`
//! from scratch. Nothing is carried over between ticks except the two
//! bid counters, which are double buffered:
//!
//!   - households report sale bids during their step (phase 3),
//!     incrementing the ACCUMULATING slot;
//!   - at the start of `record()` (phase 10) the accumulated value is
//!     moved to the COMMITTED slot and the accumulating slot resets.
//!
//! Readers only ever see committed values. Between two `record()` calls
//! every accessor returns the same already-computed value.

use crate::{
    household::{Household, HouseholdCategory},
    types::MONTHS_IN_YEAR,
};

/// Price statistics maintained outside this module.
pub trait MarketPriceStats {
    /// Exponential moving-average sale price for a quality level.
    fn exp_av_sale_price_for_quality(&self, quality: usize) -> f64;

    /// Houses built by the construction sector and not yet sold.
    fn n_unsold_new_build(&self) -> usize;
}

/// Which of the two bid counters a sale bid reports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidderKind {
    Btl,
    NonBtl,
}

impl BidderKind {
    pub fn from_btl(btl: bool) -> Self {
        if btl {
            Self::Btl
        } else {
            Self::NonBtl
        }
    }
}

/// Two-slot counter: a committed value for readers and a live one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BidCounter {
    committed: u32,
    accumulating: u32,
}

impl BidCounter {
    pub fn increment(&mut self) {
        self.accumulating += 1;
    }

    /// Publish the accumulated count and start a fresh window.
    pub fn commit(&mut self) {
        self.committed = std::mem::take(&mut self.accumulating);
    }

    pub fn committed(&self) -> u32 {
        self.committed
    }

    pub fn pending(&self) -> u32 {
        self.accumulating
    }
}

/// One tick's classification result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseholdSnapshot {
    // Category counts (sum to `population`).
    pub n_active_btl: u32,
    pub n_btl_owner_occupier: u32,
    pub n_btl_homeless: u32,
    pub n_non_btl_owner_occupier: u32,
    pub n_renting: u32,
    pub n_non_btl_homeless: u32,

    // Bankruptcies.
    pub n_btl_bankruptcies: u32,
    pub n_non_btl_bankruptcies: u32,
    pub n_non_btl_new_bankruptcies: u32,

    // Annualised gross income sums.
    pub active_btl_income: f64,
    pub owner_occupier_income: f64,
    pub renting_income: f64,
    pub homeless_income: f64,

    // Bank balance sums.
    pub bank_bal_btl: f64,
    pub bank_bal_oo: f64,
    pub bank_bal_rent: f64,
    pub bank_bal_homeless: f64,

    pub sum_stock_yield: f64,

    // Inputs captured at record time for the derived accessors.
    pub population: usize,
    pub housing_stock: usize,
    pub n_unsold_new_build: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HouseholdStats {
    snapshot: HouseholdSnapshot,
    non_btl_bids_above_av_price: BidCounter,
    btl_bids_above_av_price: BidCounter,
}

impl HouseholdStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a controlled first measure. Called at replicate start.
    pub fn init(&mut self) {
        *self = Self::default();
    }

    /// Count a sale bid if it meets or exceeds the minimum-quality
    /// moving-average sale price.
    pub fn count_bid_above_exp_av_sale_price(
        &mut self,
        kind: BidderKind,
        price: f64,
        prices: &dyn MarketPriceStats,
    ) {
        if price >= prices.exp_av_sale_price_for_quality(0) {
            match kind {
                BidderKind::Btl => self.btl_bids_above_av_price.increment(),
                BidderKind::NonBtl => self.non_btl_bids_above_av_price.increment(),
            }
        }
    }

    /// Rebuild the snapshot from the live population.
    pub fn record<'a>(
        &mut self,
        households: impl IntoIterator<Item = &'a Household>,
        prices: &dyn MarketPriceStats,
        housing_stock: usize,
    ) {
        self.non_btl_bids_above_av_price.commit();
        self.btl_bids_above_av_price.commit();

        let mut s = HouseholdSnapshot {
            housing_stock,
            n_unsold_new_build: prices.n_unsold_new_build(),
            ..HouseholdSnapshot::default()
        };

        for h in households {
            s.population += 1;
            let income = h.monthly_gross_income();

            if h.btl {
                s.bank_bal_btl += h.bank_balance;
                if h.bankrupt {
                    s.n_btl_bankruptcies += 1;
                }
            } else {
                if h.newly_bankrupt() {
                    s.n_non_btl_new_bankruptcies += 1;
                }
                if h.bankrupt {
                    s.n_non_btl_bankruptcies += 1;
                }
            }

            match h.category() {
                HouseholdCategory::ActiveBtl => {
                    s.n_active_btl += 1;
                    s.active_btl_income += income;
                }
                HouseholdCategory::BtlOwnerOccupier => {
                    s.n_btl_owner_occupier += 1;
                    s.owner_occupier_income += income;
                }
                HouseholdCategory::BtlHomeless => {
                    s.n_btl_homeless += 1;
                    s.homeless_income += income;
                }
                HouseholdCategory::NonBtlOwnerOccupier => {
                    s.n_non_btl_owner_occupier += 1;
                    s.owner_occupier_income += income;
                    s.bank_bal_oo += h.bank_balance;
                }
                HouseholdCategory::Renting => {
                    s.n_renting += 1;
                    s.renting_income += income;
                    s.bank_bal_rent += h.bank_balance;
                    if let crate::household::Occupancy::Renting {
                        quality,
                        monthly_rent,
                        ..
                    } = h.occupancy
                    {
                        let price = prices.exp_av_sale_price_for_quality(quality);
                        if price > 0.0 {
                            s.sum_stock_yield += monthly_rent * MONTHS_IN_YEAR / price;
                        }
                    }
                }
                HouseholdCategory::NonBtlHomeless => {
                    s.n_non_btl_homeless += 1;
                    s.homeless_income += income;
                    s.bank_bal_homeless += h.bank_balance;
                }
            }
        }

        // Annualise once, at the end of the pass.
        s.active_btl_income *= MONTHS_IN_YEAR;
        s.owner_occupier_income *= MONTHS_IN_YEAR;
        s.renting_income *= MONTHS_IN_YEAR;
        s.homeless_income *= MONTHS_IN_YEAR;

        self.snapshot = s;
    }

    pub fn snapshot(&self) -> &HouseholdSnapshot {
        &self.snapshot
    }

    // ── Counts ──────────────────────────────────────────────────────────

    pub fn n_btl(&self) -> u32 {
        let s = &self.snapshot;
        s.n_active_btl + s.n_btl_owner_occupier + s.n_btl_homeless
    }

    pub fn n_active_btl(&self) -> u32 {
        self.snapshot.n_active_btl
    }

    pub fn n_btl_owner_occupier(&self) -> u32 {
        self.snapshot.n_btl_owner_occupier
    }

    pub fn n_btl_homeless(&self) -> u32 {
        self.snapshot.n_btl_homeless
    }

    pub fn n_non_btl_owner_occupier(&self) -> u32 {
        self.snapshot.n_non_btl_owner_occupier
    }

    pub fn n_renting(&self) -> u32 {
        self.snapshot.n_renting
    }

    pub fn n_non_btl_homeless(&self) -> u32 {
        self.snapshot.n_non_btl_homeless
    }

    pub fn n_owner_occupier(&self) -> u32 {
        self.snapshot.n_btl_owner_occupier + self.snapshot.n_non_btl_owner_occupier
    }

    pub fn n_homeless(&self) -> u32 {
        self.snapshot.n_btl_homeless + self.snapshot.n_non_btl_homeless
    }

    pub fn n_non_owner(&self) -> u32 {
        self.snapshot.n_renting + self.n_homeless()
    }

    pub fn population(&self) -> usize {
        self.snapshot.population
    }

    /// Sum of the six category counts.
    pub fn n_classified(&self) -> u32 {
        let s = &self.snapshot;
        s.n_active_btl
            + s.n_btl_owner_occupier
            + s.n_btl_homeless
            + s.n_non_btl_owner_occupier
            + s.n_renting
            + s.n_non_btl_homeless
    }

    // ── Bankruptcies ────────────────────────────────────────────────────

    pub fn n_btl_bankruptcies(&self) -> u32 {
        self.snapshot.n_btl_bankruptcies
    }

    pub fn n_non_btl_bankruptcies(&self) -> u32 {
        self.snapshot.n_non_btl_bankruptcies
    }

    pub fn n_non_btl_new_bankruptcies(&self) -> u32 {
        self.snapshot.n_non_btl_new_bankruptcies
    }

    // ── Annualised incomes ──────────────────────────────────────────────

    pub fn active_btl_annualised_total_income(&self) -> f64 {
        self.snapshot.active_btl_income
    }

    pub fn owner_occupier_annualised_total_income(&self) -> f64 {
        self.snapshot.owner_occupier_income
    }

    pub fn renting_annualised_total_income(&self) -> f64 {
        self.snapshot.renting_income
    }

    pub fn homeless_annualised_total_income(&self) -> f64 {
        self.snapshot.homeless_income
    }

    pub fn non_owner_annualised_total_income(&self) -> f64 {
        self.snapshot.renting_income + self.snapshot.homeless_income
    }

    pub fn all_annualised_total_income(&self) -> f64 {
        let s = &self.snapshot;
        s.active_btl_income + s.owner_occupier_income + s.renting_income + s.homeless_income
    }

    // ── Bank balances ───────────────────────────────────────────────────

    pub fn bank_bal_btl(&self) -> f64 {
        self.snapshot.bank_bal_btl
    }

    pub fn bank_bal_oo(&self) -> f64 {
        self.snapshot.bank_bal_oo
    }

    pub fn bank_bal_rent(&self) -> f64 {
        self.snapshot.bank_bal_rent
    }

    pub fn bank_bal_homeless(&self) -> f64 {
        self.snapshot.bank_bal_homeless
    }

    pub fn bank_bal_all(&self) -> f64 {
        let s = &self.snapshot;
        s.bank_bal_btl + s.bank_bal_oo + s.bank_bal_rent + s.bank_bal_homeless
    }

    // ── Yields ──────────────────────────────────────────────────────────

    pub fn sum_stock_yield(&self) -> f64 {
        self.snapshot.sum_stock_yield
    }

    /// Average gross rental yield over renting households; 0.0 when
    /// nobody rents.
    pub fn av_stock_yield(&self) -> f64 {
        if self.snapshot.n_renting > 0 {
            self.snapshot.sum_stock_yield / self.snapshot.n_renting as f64
        } else {
            0.0
        }
    }

    // ── Derived ─────────────────────────────────────────────────────────

    /// Housing stock plus homeless households minus live population.
    pub fn n_empty_houses(&self) -> i64 {
        let s = &self.snapshot;
        s.housing_stock as i64 + self.n_homeless() as i64 - s.population as i64
    }

    /// Share of the stock held by BTL investors: rented houses plus empty
    /// houses not held by the construction sector.
    pub fn btl_stock_fraction(&self) -> f64 {
        let s = &self.snapshot;
        if s.housing_stock == 0 {
            return 0.0;
        }
        (self.n_empty_houses() - s.n_unsold_new_build as i64 + s.n_renting as i64) as f64
            / s.housing_stock as f64
    }

    // ── Bid counters (previous window, fully settled) ───────────────────

    pub fn n_non_btl_bids_above_exp_av_sale_price(&self) -> u32 {
        self.non_btl_bids_above_av_price.committed()
    }

    pub fn n_btl_bids_above_exp_av_sale_price(&self) -> u32 {
        self.btl_bids_above_av_price.committed()
    }
}
