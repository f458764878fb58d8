//! The simulation context for one run.
//!
//! Replaces process-wide singletons: every collaborator receives the
//! `World` by reference instead of reaching for globals. The orchestrator
//! rebuilds it at the start of each replicate, so nothing from a previous
//! replicate or invocation survives.

use crate::{
    config::SimConfig,
    household::{Household, Occupancy},
    income::{IncomeSampler, IncomeTable},
    rng::SimRng,
    types::{HouseId, HouseholdId, Tick},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub price: f64,
    pub initial_price: f64,
    pub listed_at: Tick,
}

impl Listing {
    pub fn new(price: f64, tick: Tick) -> Self {
        Self {
            price,
            initial_price: price,
            listed_at: tick,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct House {
    pub id: HouseId,
    pub quality: usize,
    /// `None` while held by the construction sector or an estate.
    pub owner: Option<HouseholdId>,
    pub resident: Option<HouseholdId>,
    pub sale: Option<Listing>,
    pub rental: Option<Listing>,
    /// Built by the construction sector and never sold yet.
    pub new_build: bool,
}

impl House {
    pub fn is_vacant(&self) -> bool {
        self.resident.is_none()
    }
}

pub struct World {
    pub config: SimConfig,
    pub rng: SimRng,
    pub income: IncomeSampler,
    /// Live population, iterated in id order.
    pub households: BTreeMap<HouseholdId, Household>,
    pub houses: Vec<House>,
    next_household_id: HouseholdId,
}

impl World {
    pub fn new(config: SimConfig, income_table: IncomeTable, rng: SimRng) -> Self {
        let income = IncomeSampler::new(income_table, config.derived.annual_income_support);
        Self {
            config,
            rng,
            income,
            households: BTreeMap::new(),
            houses: Vec::new(),
            next_household_id: 0,
        }
    }

    pub fn population(&self) -> usize {
        self.households.len()
    }

    pub fn allocate_household_id(&mut self) -> HouseholdId {
        let id = self.next_household_id;
        self.next_household_id += 1;
        id
    }

    pub fn add_house(&mut self, quality: usize, owner: Option<HouseholdId>) -> HouseId {
        let id = self.houses.len();
        self.houses.push(House {
            id,
            quality,
            owner,
            resident: None,
            sale: None,
            rental: None,
            new_build: owner.is_none(),
        });
        id
    }

    /// End a tenancy from the landlord's side: the tenant returns to
    /// social housing and the house becomes vacant.
    pub fn evict_tenant(&mut self, house: HouseId) {
        let Some(tenant) = self.houses[house].resident.take() else {
            return;
        };
        if let Some(h) = self.households.get_mut(&tenant) {
            if matches!(h.occupancy, Occupancy::Renting { home, .. } if home == house) {
                h.occupancy = Occupancy::SocialHousing;
            }
        }
    }

    /// Remove a household and release everything it held. Owned houses
    /// pass to an estate and are listed for sale at `price_for(quality)`.
    pub fn remove_household(
        &mut self,
        id: HouseholdId,
        tick: Tick,
        price_for: impl Fn(usize) -> f64,
    ) -> Option<Household> {
        let household = self.households.remove(&id)?;
        if let Occupancy::Renting { home, .. } = household.occupancy {
            self.houses[home].resident = None;
        }
        for &house in &household.owned {
            if self.houses[house].resident != Some(id) {
                self.evict_tenant(house);
            }
            let h = &mut self.houses[house];
            h.resident = None;
            h.owner = None;
            h.rental = None;
            h.sale = Some(Listing::new(price_for(h.quality), tick));
        }
        Some(household)
    }

    pub fn n_unsold_new_build(&self) -> usize {
        self.houses
            .iter()
            .filter(|h| h.new_build && h.owner.is_none())
            .count()
    }
}
