//! Baseline household behaviour (phase 3).
//!
//! Each live household, in id order:
//!   1. ages one month; every January re-draws its income from the sampler
//!   2. earns, spends on essentials, pays mortgages and rent
//!   3. consumes part of any balance above its desired level
//!   4. is flagged bankrupt when the balance goes negative
//!   5. makes its housing decision: a household in social housing bids to
//!      buy or to rent; a housed BTL investor may bid for another property
//!   6. (BTL) may put investment houses up for sale, and lists vacant ones
//!      for rent
//!
//! Sale bids are reported to the household statistics bid counters as
//! they are placed.

use crate::{
    config::{BehaviourConfig, SimConfig},
    error::SimResult,
    household::{Household, Occupancy},
    household_stats::BidderKind,
    income::IncomeSampler,
    market::{MortgageKind, RentalBid, SaleBid},
    rng::SimRng,
    subsystem::{HouseholdBehaviour, MarketContext},
    types::{HouseId, HouseholdId, Tick, MONTHS_IN_YEAR},
    world::{House, Listing, World},
};

#[derive(Debug, Clone, Default)]
pub struct BaselineBehaviour;

impl BaselineBehaviour {
    pub fn new() -> Self {
        Self
    }

    /// Balance a household aims to keep, from its annual income.
    pub fn desired_bank_balance(b: &BehaviourConfig, annual_income: f64) -> f64 {
        (b.desired_bank_balance_alpha + b.desired_bank_balance_beta * annual_income.max(1.0).ln())
            .exp()
    }

    /// Monthly flows. Returns the rent owed to a landlord, if any.
    fn settle_finances(
        h: &mut Household,
        tick: Tick,
        world_parts: (&SimConfig, &mut SimRng, &IncomeSampler, &mut [House]),
        mortgage_rate: f64,
    ) -> Option<(HouseholdId, f64)> {
        let (config, rng, income, houses) = world_parts;
        let b = &config.behaviour;

        h.was_bankrupt = h.bankrupt;
        h.age += 1.0 / MONTHS_IN_YEAR;
        if tick > 0 && tick % 12 == 0 {
            h.annual_gross_income = income.annual_gross_income(h.age, h.income_percentile, rng);
        }

        h.bank_balance += h.monthly_gross_income() * (1.0 - b.essential_consumption_fraction);

        for m in &mut h.mortgages {
            let interest = m.principal * mortgage_rate / MONTHS_IN_YEAR;
            h.bank_balance -= m.monthly_payment;
            m.principal = (m.principal + interest - m.monthly_payment).max(0.0);
            m.months_left = m.months_left.saturating_sub(1);
            if m.months_left == 0 {
                h.bank_balance -= m.principal;
                m.principal = 0.0;
            }
        }
        h.mortgages.retain(|m| m.principal > 0.0);

        let mut rent_due = None;
        let mut tenancy_over = None;
        if let Occupancy::Renting {
            home,
            monthly_rent,
            months_left,
            ..
        } = &mut h.occupancy
        {
            h.bank_balance -= *monthly_rent;
            if let Some(landlord) = houses[*home].owner {
                rent_due = Some((landlord, *monthly_rent));
            }
            *months_left = months_left.saturating_sub(1);
            if *months_left == 0 {
                tenancy_over = Some(*home);
            }
        }
        if let Some(home) = tenancy_over {
            houses[home].resident = None;
            h.occupancy = Occupancy::SocialHousing;
        }

        let desired = Self::desired_bank_balance(b, h.annual_gross_income);
        if h.bank_balance > desired {
            h.bank_balance -= b.consumption_fraction * (h.bank_balance - desired);
        }

        h.bankrupt = h.bank_balance < 0.0;
        if h.bankrupt {
            h.bank_balance = 1.0;
        }
        rent_due
    }

    /// Social-housing household: bid to buy, or else to rent.
    fn decide_rent_or_buy(
        h: &Household,
        b: &BehaviourConfig,
        rng: &mut SimRng,
        ctx: &mut MarketContext<'_>,
    ) {
        let down_payment = b.bank_balance_for_cash_downpayment * h.bank_balance;
        let kind = if h.owned.is_empty() {
            MortgageKind::FirstTimeBuyer
        } else {
            MortgageKind::HomeMover
        };
        let expected_hpa = b.hpa_expectation_factor * ctx.housing_stats.long_term_hpa();
        let desired_price = b.buy_scale * h.annual_gross_income * (1.0 + expected_hpa).max(0.0);
        let price = desired_price.min(ctx.bank.max_purchase_price(h, kind, down_payment, 0.0));
        let desired_rent = b.desired_rent_income_fraction * h.monthly_gross_income();

        if price > 0.0 {
            let buy_cost = price * (ctx.bank.mortgage_rate() - expected_hpa);
            let rent_cost = desired_rent * MONTHS_IN_YEAR * (1.0 + b.psychological_cost_of_renting);
            let x = b.sensitivity_rent_or_purchase * (rent_cost - buy_cost) / rent_cost.max(1.0);
            let p_buy = 1.0 / (1.0 + (-x).exp());
            if rng.chance(p_buy) {
                ctx.household_stats.count_bid_above_exp_av_sale_price(
                    BidderKind::from_btl(h.btl),
                    price,
                    ctx.housing_stats,
                );
                ctx.sale_market.place_bid(SaleBid {
                    bidder: h.id,
                    price,
                    kind,
                    down_payment,
                    expected_monthly_rent: 0.0,
                });
                return;
            }
        }
        if desired_rent > 0.0 {
            ctx.rental_market.place_bid(RentalBid {
                bidder: h.id,
                price: desired_rent,
            });
        }
    }

    /// Housed BTL investor: bid for another property when the expected
    /// return beats the mortgage rate.
    fn consider_investment(
        h: &Household,
        config: &SimConfig,
        rng: &mut SimRng,
        ctx: &mut MarketContext<'_>,
    ) {
        let b = &config.behaviour;
        let q = config.housing.n_quality / 2;
        let price_q = ctx.housing_stats.exp_av_sale_price(q);
        let gross_yield = ctx.rental_stats.expected_gross_yield(q, price_q);
        let cap_gain_coeff = if h.fundamentalist {
            b.fundamentalist_cap_gain_coeff
        } else {
            b.trend_cap_gain_coeff
        };
        let effective_yield = gross_yield + cap_gain_coeff * ctx.housing_stats.long_term_hpa();
        let margin = effective_yield - ctx.bank.mortgage_rate();
        if margin <= 0.0 {
            return;
        }
        let p_invest = (1.0 - (-b.btl_choice_intensity * margin).exp()) / MONTHS_IN_YEAR;
        if !rng.chance(p_invest) {
            return;
        }
        let down_payment = b.bank_balance_for_cash_downpayment * h.bank_balance;
        let expected_rent = ctx.rental_stats.exp_av_rent_price(q);
        let price = ctx
            .bank
            .max_purchase_price(h, MortgageKind::BuyToLet, down_payment, expected_rent);
        if price <= 0.0 {
            return;
        }
        ctx.household_stats
            .count_bid_above_exp_av_sale_price(BidderKind::Btl, price, ctx.housing_stats);
        ctx.sale_market.place_bid(SaleBid {
            bidder: h.id,
            price,
            kind: MortgageKind::BuyToLet,
            down_payment,
            expected_monthly_rent: expected_rent,
        });
    }

    /// BTL portfolio upkeep: occasional sales, rental listings for vacant houses.
    fn manage_portfolio(
        investments: &[HouseId],
        tick: Tick,
        b: &BehaviourConfig,
        rng: &mut SimRng,
        houses: &mut [House],
        ctx: &MarketContext<'_>,
    ) {
        let p_sell = (b.decision_to_sell_alpha * b.btl_sell_scale).clamp(0.0, 1.0);
        for &id in investments {
            let house = &mut houses[id];
            if house.sale.is_some() {
                continue;
            }
            if rng.chance(p_sell) {
                house.rental = None;
                house.sale = Some(Listing::new(
                    ctx.housing_stats.exp_av_sale_price(house.quality),
                    tick,
                ));
            } else if house.is_vacant() && house.rental.is_none() {
                house.rental = Some(Listing::new(
                    ctx.rental_stats.exp_av_rent_price(house.quality),
                    tick,
                ));
            }
        }
    }
}

impl HouseholdBehaviour for BaselineBehaviour {
    fn name(&self) -> &'static str {
        "household_behaviour"
    }

    fn init(&mut self, _config: &SimConfig) {}

    fn step(&mut self, tick: Tick, world: &mut World, ctx: &mut MarketContext<'_>) -> SimResult<()> {
        let World {
            config,
            rng,
            income,
            households,
            houses,
            ..
        } = world;
        let config: &SimConfig = config;
        let mortgage_rate = ctx.bank.mortgage_rate();

        let ids: Vec<HouseholdId> = households.keys().copied().collect();
        for id in ids {
            let Some(h) = households.get_mut(&id) else {
                continue;
            };
            let rent_due = Self::settle_finances(
                h,
                tick,
                (config, &mut *rng, &*income, houses.as_mut_slice()),
                mortgage_rate,
            );
            if let Some((landlord, rent)) = rent_due {
                if let Some(l) = households.get_mut(&landlord) {
                    l.bank_balance += rent;
                }
            }

            let Some(h) = households.get(&id) else {
                continue;
            };
            let b = &config.behaviour;
            match h.occupancy {
                Occupancy::SocialHousing if !h.bankrupt => {
                    Self::decide_rent_or_buy(h, b, rng, ctx);
                }
                Occupancy::OwnerOccupier { .. } if h.btl && !h.bankrupt => {
                    Self::consider_investment(h, config, rng, ctx);
                }
                _ => {}
            }
            if h.btl {
                let investments: Vec<HouseId> = h.investment_houses().collect();
                Self::manage_portfolio(&investments, tick, b, rng, houses, ctx);
            }
        }
        Ok(())
    }
}
