//! The simulation engine: replicates, the tick pipeline and result capture.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!    1. Demographics          population change
//!    2. Construction          housing stock change
//!    3. Household behaviour   every live household steps, emits bids
//!    4. Housing market stats  sale pre-clearing record
//!    5. Sale market           clearing
//!    6. Housing market stats  sale post-clearing record
//!    7. Rental market stats   pre-clearing record
//!    8. Rental market         clearing
//!    9. Rental market stats   post-clearing record
//!   10. Household stats       record()
//!   11. Credit supply         new-mortgage bookkeeping
//!   12. Bank                  rate update (needs live population size)
//!   13. Central bank          policy update (needs indicators from 10)
//!
//! RULES:
//!   - No phase observes a later phase's effects within the same tick.
//!   - All randomness in a replicate flows through `World::rng`.
//!   - Every replicate starts from a freshly built `World` and freshly
//!     initialised models; nothing carries over.
//!   - Scheduled shocks fire at the start of their tick, before phase 1,
//!     exactly once per replicate.

use crate::{
    bank_subsystem::BaselineBank,
    central_bank_subsystem::BaselineCentralBank,
    config::{ScheduledShock, SimConfig},
    construction_subsystem::BaselineConstruction,
    core_indicators::CoreIndicators,
    credit_supply::CreditSupply,
    demographics_subsystem::BaselineDemographics,
    error::SimResult,
    household_stats::HouseholdStats,
    household_subsystem::BaselineBehaviour,
    housing_market_stats::HousingMarketStats,
    income::IncomeTable,
    rental_market_stats::RentalMarketStats,
    rental_market_subsystem::BaselineRentalMarket,
    results::{MetricSources, ResultMatrix, ResultRecorder},
    rng::SimRng,
    sale_market_subsystem::BaselineSaleMarket,
    subsystem::{
        Bank, CentralBank, Construction, Demographics, HouseholdBehaviour, MarketContext,
        RentalMarket, SaleMarket,
    },
    types::Tick,
    world::World,
};

/// Ticks between progress log lines.
pub const PROGRESS_INTERVAL: Tick = 100;

/// Every collaborator the pipeline drives.
pub struct Models {
    pub demographics: Box<dyn Demographics>,
    pub construction: Box<dyn Construction>,
    pub behaviour: Box<dyn HouseholdBehaviour>,
    pub sale_market: Box<dyn SaleMarket>,
    pub rental_market: Box<dyn RentalMarket>,
    pub bank: Box<dyn Bank>,
    pub central_bank: Box<dyn CentralBank>,
    pub housing_stats: HousingMarketStats,
    pub rental_stats: RentalMarketStats,
    pub household_stats: HouseholdStats,
    pub credit: CreditSupply,
    pub core: CoreIndicators,
}

impl Models {
    /// The built-in baseline collaborators.
    pub fn baseline(config: &SimConfig) -> Self {
        Self {
            demographics: Box::new(BaselineDemographics::new()),
            construction: Box::new(BaselineConstruction::new()),
            behaviour: Box::new(BaselineBehaviour::new()),
            sale_market: Box::new(BaselineSaleMarket::new()),
            rental_market: Box::new(BaselineRentalMarket::new()),
            bank: Box::new(BaselineBank::new()),
            central_bank: Box::new(BaselineCentralBank::new(config)),
            housing_stats: HousingMarketStats::new(),
            rental_stats: RentalMarketStats::new(),
            household_stats: HouseholdStats::new(),
            credit: CreditSupply::new(),
            core: CoreIndicators::new(),
        }
    }

    /// Reset every collaborator for a new replicate.
    pub fn init(&mut self, config: &SimConfig) {
        self.demographics.init(config);
        self.construction.init(config);
        self.behaviour.init(config);
        self.sale_market.init();
        self.rental_market.init();
        self.bank.init(config);
        self.central_bank.init(config);
        self.housing_stats.init(config);
        self.rental_stats.init(config);
        self.household_stats.init();
        self.credit.init(config.housing.n_quality);
        self.core.init();
    }

    pub fn sources(&self) -> MetricSources<'_> {
        MetricSources {
            households: &self.household_stats,
            housing: &self.housing_stats,
            rental: &self.rental_stats,
            credit: &self.credit,
            core: &self.core,
            bank: self.bank.as_ref(),
            construction: self.construction.as_ref(),
        }
    }
}

pub struct SimEngine {
    config: SimConfig,
    income_table: IncomeTable,
    seed: u64,
    models: Models,
    world: Option<World>,
    shocks_fired: usize,
}

impl SimEngine {
    /// Engine with the baseline collaborators. `config` must already have
    /// its derived parameters computed. `income_table` is the pristine
    /// table; each replicate samples from a fresh clone so income shocks
    /// never carry across replicates.
    pub fn new(config: SimConfig, income_table: IncomeTable, seed: u64) -> Self {
        let models = Models::baseline(&config);
        Self::with_models(config, income_table, seed, models)
    }

    pub fn with_models(config: SimConfig, income_table: IncomeTable, seed: u64, models: Models) -> Self {
        Self {
            config,
            income_table,
            seed,
            models,
            world: None,
            shocks_fired: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    /// The final replicate's world, once `run()` has completed.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Scheduled shocks fired in the most recent replicate.
    pub fn shocks_fired(&self) -> usize {
        self.shocks_fired
    }

    /// Run every replicate and collect the result matrix.
    pub fn run(&mut self) -> SimResult<ResultMatrix> {
        self.run_observed(|_, _, _| {})
    }

    /// As `run()`, calling `observer` after every completed tick.
    pub fn run_observed(
        &mut self,
        mut observer: impl FnMut(Tick, &World, &Models),
    ) -> SimResult<ResultMatrix> {
        let run = self.config.run.clone();
        let mut recorder = ResultRecorder::new(
            run.replicate_mode,
            run.time_to_start_recording,
            self.config.derived.recorded_steps,
        );
        for replicate in 0..run.n_sims {
            log::info!(
                "Replicate {}/{} (seed {}, {} ticks)",
                replicate + 1,
                run.n_sims,
                self.seed,
                run.n_steps
            );
            recorder.begin_replicate();
            self.run_replicate(replicate, &mut recorder, &mut observer)?;
        }
        Ok(recorder.finish())
    }

    fn run_replicate(
        &mut self,
        replicate: u32,
        recorder: &mut ResultRecorder,
        observer: &mut impl FnMut(Tick, &World, &Models),
    ) -> SimResult<()> {
        let mut world = World::new(
            self.config.clone(),
            self.income_table.clone(),
            SimRng::for_replicate(self.seed, replicate),
        );
        self.models.init(&self.config);
        self.shocks_fired = 0;
        let mut fired = vec![false; self.config.scheduled_shocks.len()];

        for tick in 0..self.config.run.n_steps {
            self.apply_scheduled_shocks(tick, &mut world, &mut fired);
            self.tick(tick, &mut world)?;
            recorder.record(tick, &self.models.sources());
            observer(tick, &world, &self.models);

            if tick % PROGRESS_INTERVAL == 0 {
                log::debug!(
                    "Tick {tick}: population {}, stock {}",
                    world.population(),
                    self.models.construction.housing_stock()
                );
            }
        }
        self.world = Some(world);
        Ok(())
    }

    fn apply_scheduled_shocks(&mut self, tick: Tick, world: &mut World, fired: &mut [bool]) {
        for (shock, done) in self.config.scheduled_shocks.iter().zip(fired.iter_mut()) {
            if *done || shock.tick() != tick {
                continue;
            }
            match *shock {
                ScheduledShock::LtvCap {
                    ftb,
                    home_mover,
                    btl,
                    ..
                } => self.models.bank.set_all_ltv(ftb, home_mover, btl),
                ScheduledShock::IncomeShock { factor, .. } => world.income.shock(factor),
            }
            *done = true;
            self.shocks_fired += 1;
            log::info!("Tick {tick}: scheduled shock fired: {shock:?}");
        }
    }

    /// Advance one tick through the 13 phases.
    fn tick(&mut self, tick: Tick, world: &mut World) -> SimResult<()> {
        let m = &mut self.models;

        m.demographics.step(tick, world, &m.housing_stats)?;
        m.construction.step(tick, world, &m.housing_stats)?;
        {
            let mut ctx = MarketContext {
                sale_market: m.sale_market.as_mut(),
                rental_market: m.rental_market.as_mut(),
                bank: m.bank.as_ref(),
                housing_stats: &m.housing_stats,
                rental_stats: &m.rental_stats,
                household_stats: &mut m.household_stats,
            };
            m.behaviour.step(tick, world, &mut ctx)?;
        }

        m.housing_stats.pre_clearing_record(world, m.sale_market.bids());
        let sales = m
            .sale_market
            .clear(tick, world, m.bank.as_mut(), &mut m.credit)?;
        m.housing_stats.post_clearing_record(world, &sales);

        m.rental_stats.pre_clearing_record(world, m.rental_market.bids());
        let lets = m.rental_market.clear(tick, world)?;
        m.rental_stats.post_clearing_record(&lets);

        m.household_stats.record(
            world.households.values(),
            &m.housing_stats,
            m.construction.housing_stock(),
        );
        m.credit.record(world.households.values());
        m.bank.step(world.population(), &m.credit, m.central_bank.policy());

        m.core
            .update(&m.household_stats, &m.housing_stats, &m.credit, m.bank.as_ref());
        m.central_bank.step(tick, &m.core);
        Ok(())
    }
}
