//! Baseline construction sector.
//!
//! The first step builds the whole initial stock. After that the sector
//! builds a fraction of the gap between the stock and its target (which
//! tracks the live population), capped per month. Every new build goes on
//! sale at the moving-average price for its quality.

use crate::{
    config::SimConfig,
    error::SimResult,
    housing_market_stats::HousingMarketStats,
    subsystem::Construction,
    types::Tick,
    world::{Listing, World},
};

#[derive(Debug, Clone, Default)]
pub struct BaselineConstruction {
    housing_stock: usize,
    n_new_build: usize,
}

impl BaselineConstruction {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(world: &mut World, tick: Tick, prices: &HousingMarketStats, n: usize) {
        let n_quality = world.config.housing.n_quality as u64;
        for _ in 0..n {
            let quality = world.rng.next_u64_below(n_quality) as usize;
            let id = world.add_house(quality, None);
            world.houses[id].sale = Some(Listing::new(prices.exp_av_sale_price(quality), tick));
        }
    }
}

impl Construction for BaselineConstruction {
    fn name(&self) -> &'static str {
        "construction"
    }

    fn init(&mut self, _config: &SimConfig) {
        *self = Self::default();
    }

    fn step(&mut self, tick: Tick, world: &mut World, prices: &HousingMarketStats) -> SimResult<()> {
        let h = &world.config.housing;
        let (per_household, rate, cap) =
            (h.houses_per_household, h.construction_rate, h.max_new_builds_per_month);

        let n = if world.houses.is_empty() {
            world.config.derived.housing_stock_target
        } else {
            let target = (world.population() as f64 * per_household).round() as usize;
            let deficit = target.saturating_sub(world.houses.len());
            ((deficit as f64 * rate).ceil() as usize).min(cap)
        };

        Self::build(world, tick, prices, n);
        self.n_new_build = n;
        self.housing_stock = world.houses.len();
        if n > 0 {
            log::debug!("Tick {tick}: built {n} houses, stock {}", self.housing_stock);
        }
        Ok(())
    }

    fn housing_stock(&self) -> usize {
        self.housing_stock
    }

    fn n_new_build(&self) -> usize {
        self.n_new_build
    }
}
