//! Baseline sale market.
//!
//! Clearing: bids in descending price order (ties by bidder id). Each bid
//! takes the highest-quality listed house it can afford, the cheapest
//! within that quality, and pays the asking price. A bid whose mortgage
//! the bank refuses drops out; the house stays listed. Listings left
//! unsold at the end of clearing are cut in price.

use crate::{
    credit_supply::CreditSupply,
    error::SimResult,
    household::{Mortgage, Occupancy},
    market::{SaleBid, SaleRecord},
    subsystem::{Bank, SaleMarket},
    types::{HouseId, Tick},
    world::{House, World},
};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct BaselineSaleMarket {
    bids: Vec<SaleBid>,
}

impl BaselineSaleMarket {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Listed houses per quality level, cheapest first, ties by id.
pub(crate) fn offers_by_quality(
    houses: &[House],
    n_quality: usize,
    price_of: impl Fn(&House) -> Option<f64>,
) -> Vec<VecDeque<(HouseId, f64)>> {
    let mut offers: Vec<Vec<(HouseId, f64)>> = vec![Vec::new(); n_quality];
    for house in houses {
        if let Some(price) = price_of(house) {
            if let Some(level) = offers.get_mut(house.quality) {
                level.push((house.id, price));
            }
        }
    }
    offers
        .into_iter()
        .map(|mut level| {
            level.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            level.into()
        })
        .collect()
}

/// Highest quality level whose cheapest offer is within `budget`.
pub(crate) fn best_affordable(
    offers: &[VecDeque<(HouseId, f64)>],
    budget: f64,
    exclude: impl Fn(HouseId) -> bool,
) -> Option<(usize, usize)> {
    for quality in (0..offers.len()).rev() {
        let found = offers[quality]
            .iter()
            .take_while(|(_, price)| *price <= budget)
            .position(|(id, _)| !exclude(*id));
        if let Some(pos) = found {
            return Some((quality, pos));
        }
    }
    None
}

impl SaleMarket for BaselineSaleMarket {
    fn init(&mut self) {
        self.bids.clear();
    }

    fn place_bid(&mut self, bid: SaleBid) {
        self.bids.push(bid);
    }

    fn bids(&self) -> &[SaleBid] {
        &self.bids
    }

    fn clear(
        &mut self,
        tick: Tick,
        world: &mut World,
        bank: &mut dyn Bank,
        credit: &mut CreditSupply,
    ) -> SimResult<Vec<SaleRecord>> {
        let mut bids = std::mem::take(&mut self.bids);
        bids.sort_by(|a, b| b.price.total_cmp(&a.price).then(a.bidder.cmp(&b.bidder)));

        let mut offers = offers_by_quality(&world.houses, world.config.housing.n_quality, |h| {
            h.sale.as_ref().map(|l| l.price)
        });
        let mut sales = Vec::new();

        for bid in bids {
            let Some(buyer) = world.households.get(&bid.bidder) else {
                continue;
            };
            if !bid.kind.is_btl() && !buyer.is_in_social_housing() {
                continue;
            }
            let owned = &buyer.owned;
            let Some((quality, pos)) =
                best_affordable(&offers, bid.price, |id| owned.contains(&id))
            else {
                continue;
            };
            let (house_id, price) = offers[quality][pos];
            let Some(approval) = bank.request_approval(
                buyer,
                bid.kind,
                price,
                bid.down_payment,
                bid.expected_monthly_rent,
            ) else {
                continue;
            };
            let buyer_income = buyer.annual_gross_income;
            offers[quality].remove(pos);

            // Seller side.
            let house = &mut world.houses[house_id];
            let listing = house.sale.take();
            let listed_at = listing.map_or(tick, |l| l.listed_at);
            let seller = house.owner;
            let new_build = house.new_build;
            house.new_build = false;
            house.rental = None;
            if let Some(seller_id) = seller {
                if let Some(s) = world.households.get_mut(&seller_id) {
                    s.bank_balance += price;
                    if let Some(i) = s.mortgages.iter().position(|m| m.house == house_id) {
                        let m = s.mortgages.remove(i);
                        s.bank_balance -= m.principal;
                    }
                    s.owned.retain(|&h| h != house_id);
                    if s.home() == Some(house_id) {
                        s.occupancy = Occupancy::SocialHousing;
                    }
                }
            }
            if world.houses[house_id].resident != seller {
                world.evict_tenant(house_id);
            }

            // Buyer side.
            let house = &mut world.houses[house_id];
            house.resident = None;
            house.owner = Some(bid.bidder);
            if let Some(b) = world.households.get_mut(&bid.bidder) {
                b.bank_balance -= approval.down_payment;
                b.owned.push(house_id);
                if approval.principal > 0.0 {
                    b.mortgages.push(Mortgage {
                        house: house_id,
                        principal: approval.principal,
                        monthly_payment: approval.monthly_payment,
                        months_left: approval.term_months,
                        btl: bid.kind.is_btl(),
                    });
                }
                if !bid.kind.is_btl() {
                    b.occupancy = Occupancy::OwnerOccupier {
                        home: house_id,
                        quality,
                    };
                    house.resident = Some(bid.bidder);
                }
            }
            if approval.principal > 0.0 {
                credit.record_new_mortgage(bid.kind, quality, price, &approval, buyer_income);
            }

            sales.push(SaleRecord {
                house: house_id,
                quality,
                price,
                buyer: bid.bidder,
                seller,
                kind: bid.kind,
                months_on_market: tick.saturating_sub(listed_at),
                new_build,
            });
        }

        let reduction = world.config.housing.sale_price_reduction;
        for house in &mut world.houses {
            if let Some(listing) = &mut house.sale {
                if listing.listed_at < tick {
                    listing.price *= 1.0 - reduction;
                }
            }
        }
        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house(id: HouseId, quality: usize) -> House {
        House {
            id,
            quality,
            owner: None,
            resident: None,
            sale: None,
            rental: None,
            new_build: true,
        }
    }

    #[test]
    fn best_affordable_prefers_quality_then_price() {
        let houses = vec![house(0, 0), house(1, 2), house(2, 2), house(3, 3)];
        let prices = [100.0, 300.0, 250.0, 500.0];
        let offers = offers_by_quality(&houses, 4, |h| Some(prices[h.id]));

        let (q, pos) = best_affordable(&offers, 320.0, |_| false).unwrap();
        assert_eq!(q, 2);
        assert_eq!(offers[q][pos].0, 2, "cheapest house within the quality wins");

        assert!(best_affordable(&offers, 50.0, |_| false).is_none());
        let (q, pos) = best_affordable(&offers, 320.0, |id| id == 2).unwrap();
        assert_eq!((q, offers[q][pos].0), (2, 1));
    }

    #[test]
    fn offer_book_skips_unlisted_and_breaks_ties_by_id() {
        let houses = vec![house(0, 1), house(1, 1), house(2, 1), house(3, 1)];
        let prices = [Some(200.0), None, Some(150.0), Some(150.0)];
        let offers = offers_by_quality(&houses, 2, |h| prices[h.id]);

        assert!(offers[0].is_empty());
        let ids: Vec<HouseId> = offers[1].iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2, 3, 0]);
    }
}
