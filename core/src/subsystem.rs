//! Collaborator traits.
//!
//! RULE: Every model the tick pipeline drives sits behind one of these
//! traits. The engine calls them in the fixed phase order documented in
//! engine.rs; no collaborator calls another collaborator's step directly.
//! Everything a step needs is passed in by reference.

use crate::{
    config::SimConfig,
    credit_supply::CreditSupply,
    core_indicators::CoreIndicators,
    error::SimResult,
    household::Household,
    household_stats::HouseholdStats,
    housing_market_stats::HousingMarketStats,
    market::{LetRecord, MortgageKind, RentalBid, SaleBid, SaleRecord},
    rental_market_stats::RentalMarketStats,
    types::Tick,
    world::World,
};

/// Phase 1: population change.
pub trait Demographics {
    fn name(&self) -> &'static str;

    fn init(&mut self, config: &SimConfig);

    fn step(&mut self, tick: Tick, world: &mut World, prices: &HousingMarketStats)
        -> SimResult<()>;
}

/// Phase 2: housing stock change.
pub trait Construction {
    fn name(&self) -> &'static str;

    fn init(&mut self, config: &SimConfig);

    fn step(&mut self, tick: Tick, world: &mut World, prices: &HousingMarketStats)
        -> SimResult<()>;

    fn housing_stock(&self) -> usize;

    /// Houses completed during the most recent step.
    fn n_new_build(&self) -> usize;
}

/// Everything a household can observe or act on during phase 3.
pub struct MarketContext<'a> {
    pub sale_market: &'a mut dyn SaleMarket,
    pub rental_market: &'a mut dyn RentalMarket,
    pub bank: &'a dyn Bank,
    pub housing_stats: &'a HousingMarketStats,
    pub rental_stats: &'a RentalMarketStats,
    pub household_stats: &'a mut HouseholdStats,
}

/// Phase 3: every live household steps, in id order.
pub trait HouseholdBehaviour {
    fn name(&self) -> &'static str;

    fn init(&mut self, config: &SimConfig);

    fn step(&mut self, tick: Tick, world: &mut World, ctx: &mut MarketContext<'_>)
        -> SimResult<()>;
}

/// Phases 4-6: owner-occupier and BTL purchases.
pub trait SaleMarket {
    fn init(&mut self);

    fn place_bid(&mut self, bid: SaleBid);

    fn bids(&self) -> &[SaleBid];

    /// Match this tick's bids against the listed houses. Bids are consumed;
    /// unsold listings stay listed at a reduced price.
    fn clear(
        &mut self,
        tick: Tick,
        world: &mut World,
        bank: &mut dyn Bank,
        credit: &mut CreditSupply,
    ) -> SimResult<Vec<SaleRecord>>;
}

/// Phases 7-9: tenancies.
pub trait RentalMarket {
    fn init(&mut self);

    fn place_bid(&mut self, bid: RentalBid);

    fn bids(&self) -> &[RentalBid];

    fn clear(&mut self, tick: Tick, world: &mut World) -> SimResult<Vec<LetRecord>>;
}

/// A mortgage the bank has agreed to issue.
#[derive(Debug, Clone, PartialEq)]
pub struct MortgageApproval {
    pub principal: f64,
    pub monthly_payment: f64,
    pub down_payment: f64,
    pub term_months: u32,
}

/// Macroprudential policy as published by the central bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub max_oo_lti: f64,
}

/// Mortgage lender. Phase 12 updates its rate.
pub trait Bank {
    fn init(&mut self, config: &SimConfig);

    fn mortgage_rate(&self) -> f64;

    fn interest_rate_spread(&self) -> f64;

    fn max_ltv(&self, kind: MortgageKind) -> f64;

    fn max_oo_lti(&self) -> f64;

    /// Highest price this household could bid, given its cash down payment
    /// and, for BTL purchases, the rent the house is expected to earn.
    fn max_purchase_price(
        &self,
        household: &Household,
        kind: MortgageKind,
        down_payment: f64,
        expected_monthly_rent: f64,
    ) -> f64;

    /// Approve (or refuse) a loan for a purchase at `price`.
    fn request_approval(
        &mut self,
        household: &Household,
        kind: MortgageKind,
        price: f64,
        down_payment: f64,
        expected_monthly_rent: f64,
    ) -> Option<MortgageApproval>;

    /// Tighten or relax every loan-to-value ceiling at once.
    fn set_all_ltv(&mut self, ftb: f64, home_mover: f64, btl: f64);

    /// Adjust the spread toward the credit supply target and adopt the
    /// central bank's latest policy.
    fn step(&mut self, n_households: usize, credit: &CreditSupply, policy: &Policy);

    /// Target new lending for the current month.
    fn supply_val(&self) -> f64;
}

/// Phase 13: macroprudential policy.
pub trait CentralBank {
    fn init(&mut self, config: &SimConfig);

    fn step(&mut self, tick: Tick, indicators: &CoreIndicators);

    fn policy(&self) -> &Policy;
}
