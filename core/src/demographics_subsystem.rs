//! Baseline demographics.
//!
//! Tick 0 fills the population up to its target with ages drawn
//! uniformly from the initial age range. Afterwards each month brings
//! births (new households entering social housing) and age-dependent
//! deaths. A deceased household's houses go to an estate sale at the
//! current moving-average price for their quality.

use crate::{
    config::SimConfig,
    error::SimResult,
    household::Household,
    housing_market_stats::HousingMarketStats,
    subsystem::Demographics,
    types::{HouseholdId, Tick, MONTHS_IN_YEAR},
    world::World,
};

#[derive(Debug, Clone, Default)]
pub struct BaselineDemographics {
    births: u32,
    deaths: u32,
}

impl BaselineDemographics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn births(&self) -> u32 {
        self.births
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    fn spawn(world: &mut World, age: f64) {
        let id = world.allocate_household_id();
        let pop = &world.config.population;
        let (p_investor, p_fundamentalist, balance_fraction) =
            (pop.p_investor, pop.p_fundamentalist, pop.initial_balance_fraction);

        let percentile = world.rng.next_f64();
        let income = world
            .income
            .annual_gross_income(age, percentile, &mut world.rng);
        let balance = income * balance_fraction * world.rng.next_f64();
        let btl = world.rng.chance(p_investor);
        let fundamentalist = btl && world.rng.chance(p_fundamentalist);

        world.households.insert(
            id,
            Household::new(id, age, percentile, income, balance, btl, fundamentalist),
        );
    }

    /// Monthly probability of death at `age`.
    pub fn monthly_mortality(config: &SimConfig, age: f64) -> f64 {
        let p = &config.population;
        let annual = p.mortality_base * (p.mortality_growth * (age - 20.0)).exp();
        (annual / MONTHS_IN_YEAR).clamp(0.0, 1.0)
    }
}

impl Demographics for BaselineDemographics {
    fn name(&self) -> &'static str {
        "demographics"
    }

    fn init(&mut self, _config: &SimConfig) {
        *self = Self::default();
    }

    fn step(&mut self, tick: Tick, world: &mut World, prices: &HousingMarketStats) -> SimResult<()> {
        self.births = 0;
        self.deaths = 0;

        if tick == 0 && world.households.is_empty() {
            let (target, lo, hi) = {
                let p = &world.config.population;
                (p.target_population, p.initial_age_min, p.initial_age_max)
            };
            for _ in 0..target {
                let age = world.rng.uniform(lo, hi);
                Self::spawn(world, age);
            }
            self.births = target as u32;
            log::debug!("Initial population of {target} households");
            return Ok(());
        }

        // Births.
        let expected = world.config.population.target_population as f64
            * world.config.derived.monthly_birth_probability;
        let mut n_births = expected.floor() as usize;
        if world.rng.chance(expected.fract()) {
            n_births += 1;
        }
        let (lo, hi) = (
            world.config.population.newborn_age_min,
            world.config.population.newborn_age_max,
        );
        for _ in 0..n_births {
            let age = world.rng.uniform(lo, hi);
            Self::spawn(world, age);
        }
        self.births = n_births as u32;

        // Deaths, in id order.
        let ids: Vec<(HouseholdId, f64)> =
            world.households.values().map(|h| (h.id, h.age)).collect();
        for (id, age) in ids {
            let p = Self::monthly_mortality(&world.config, age);
            if world.rng.chance(p) {
                world.remove_household(id, tick, |q| prices.exp_av_sale_price(q));
                self.deaths += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mortality_grows_with_age() {
        let config = SimConfig::default_test();
        let young = BaselineDemographics::monthly_mortality(&config, 25.0);
        let old = BaselineDemographics::monthly_mortality(&config, 85.0);
        assert!(old > young * 10.0, "old={old} young={young}");
        assert!(old <= 1.0);
    }
}
