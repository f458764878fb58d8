//! Baseline rental market. Same matching rule as the sale market: bids in
//! descending rent order take the best affordable quality, cheapest first.
//! Tenancy length is drawn uniformly from the configured range.

use crate::{
    error::SimResult,
    household::Occupancy,
    market::{LetRecord, RentalBid},
    sale_market_subsystem::{best_affordable, offers_by_quality},
    subsystem::RentalMarket,
    types::Tick,
    world::World,
};

#[derive(Debug, Clone, Default)]
pub struct BaselineRentalMarket {
    bids: Vec<RentalBid>,
}

impl BaselineRentalMarket {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RentalMarket for BaselineRentalMarket {
    fn init(&mut self) {
        self.bids.clear();
    }

    fn place_bid(&mut self, bid: RentalBid) {
        self.bids.push(bid);
    }

    fn bids(&self) -> &[RentalBid] {
        &self.bids
    }

    fn clear(&mut self, tick: Tick, world: &mut World) -> SimResult<Vec<LetRecord>> {
        let mut bids = std::mem::take(&mut self.bids);
        bids.sort_by(|a, b| b.price.total_cmp(&a.price).then(a.bidder.cmp(&b.bidder)));

        let mut offers = offers_by_quality(&world.houses, world.config.housing.n_quality, |h| {
            match (&h.rental, h.owner, h.resident) {
                (Some(l), Some(_), None) => Some(l.price),
                _ => None,
            }
        });
        let (min_months, max_months) = (
            world.config.housing.tenancy_months_min,
            world.config.housing.tenancy_months_max,
        );
        let mut lets = Vec::new();

        for bid in bids {
            let Some(tenant) = world.households.get(&bid.bidder) else {
                continue;
            };
            if !tenant.is_in_social_housing() {
                continue;
            }
            let owned = &tenant.owned;
            let Some((quality, pos)) =
                best_affordable(&offers, bid.price, |id| owned.contains(&id))
            else {
                continue;
            };
            let Some((house_id, rent)) = offers[quality].remove(pos) else {
                continue;
            };
            let span = u64::from(max_months - min_months) + 1;
            let months = min_months + world.rng.next_u64_below(span) as u32;

            let house = &mut world.houses[house_id];
            let Some(landlord) = house.owner else {
                continue;
            };
            let listed_at = house.rental.take().map_or(tick, |l| l.listed_at);
            house.resident = Some(bid.bidder);
            if let Some(tenant) = world.households.get_mut(&bid.bidder) {
                tenant.occupancy = Occupancy::Renting {
                    home: house_id,
                    quality,
                    monthly_rent: rent,
                    months_left: months,
                };
            }
            lets.push(LetRecord {
                house: house_id,
                quality,
                monthly_rent: rent,
                tenant: bid.bidder,
                landlord,
                months_on_market: tick.saturating_sub(listed_at),
            });
        }

        let reduction = world.config.housing.rent_price_reduction;
        for house in &mut world.houses {
            if let Some(listing) = &mut house.rental {
                if listing.listed_at < tick {
                    listing.price *= 1.0 - reduction;
                }
            }
        }
        Ok(lets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SimConfig, household::Household, income::IncomeTable, rng::SimRng,
        world::Listing,
    };

    fn world() -> World {
        let table = IncomeTable::from_rows(&[[16.0, 100.0, 9.0, 10.0, 1.0]], 1).unwrap();
        World::new(SimConfig::default_test(), table, SimRng::new(1))
    }

    #[test]
    fn landlord_never_rents_its_own_house() {
        let mut world = world();
        let mut landlord = Household::new(0, 40.0, 0.5, 40_000.0, 10_000.0, true, false);
        let other = Household::new(1, 50.0, 0.5, 40_000.0, 10_000.0, true, false);

        let own = world.add_house(3, Some(0));
        let theirs = world.add_house(3, Some(1));
        world.houses[own].rental = Some(Listing::new(500.0, 0));
        world.houses[theirs].rental = Some(Listing::new(700.0, 0));
        landlord.owned.push(own);
        world.households.insert(0, landlord);
        world.households.insert(1, other);

        let mut market = BaselineRentalMarket::new();
        market.place_bid(RentalBid {
            bidder: 0,
            price: 1_000.0,
        });
        let lets = market.clear(1, &mut world).unwrap();

        assert_eq!(lets.len(), 1);
        assert_eq!(lets[0].house, theirs);
        assert_eq!(lets[0].landlord, 1);
        assert!(world.houses[own].rental.is_some(), "own listing stays on the market");
        assert_eq!(world.houses[theirs].resident, Some(0));
    }
}
