//! Tick pipeline, replicates and scheduled shocks.

use housing_core::{
    config::{ReplicateMode, ScheduledShock, SimConfig},
    engine::SimEngine,
    income::IncomeTable,
    market::MortgageKind,
    results::{Metric, ResultMatrix},
    subsystem::Bank,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn data_table() -> IncomeTable {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/income/IncomeGivenAge.csv");
    IncomeTable::load(path, 16).expect("income table loads")
}

/// Short run: 40 ticks, last 10 recorded.
fn short_config() -> SimConfig {
    let mut config = SimConfig::default_test();
    config.run.n_steps = 40;
    config.run.time_to_start_recording = 30;
    config.population.target_population = 150;
    config.set_derived_params();
    config
}

fn run(config: SimConfig, seed: u64) -> ResultMatrix {
    SimEngine::new(config, data_table(), seed)
        .run()
        .expect("run completes")
}

// ── Per-tick invariants ─────────────────────────────────────────────────────

#[test]
fn every_household_is_classified_each_tick() {
    let mut engine = SimEngine::new(short_config(), data_table(), 21);
    let mut ticks_seen = 0;

    engine
        .run_observed(|tick, world, models| {
            ticks_seen += 1;
            let stats = &models.household_stats;
            assert_eq!(
                stats.n_classified() as usize,
                world.population(),
                "tick {tick}: classified {} of {}",
                stats.n_classified(),
                world.population()
            );
            assert!(
                stats.n_non_btl_new_bankruptcies() <= stats.n_non_btl_bankruptcies(),
                "tick {tick}: more new bankruptcies than bankruptcies"
            );
            assert!(stats.av_stock_yield() >= 0.0, "tick {tick}: negative yield");
        })
        .expect("run completes");

    assert_eq!(ticks_seen, 40);
}

#[test]
fn tenants_live_in_houses_that_point_back() {
    let mut engine = SimEngine::new(short_config(), data_table(), 8);
    engine
        .run_observed(|tick, world, _| {
            for h in world.households.values() {
                if let Some(home) = h.home() {
                    assert_eq!(
                        world.houses[home].resident,
                        Some(h.id),
                        "tick {tick}: household {} not resident in its home {home}",
                        h.id
                    );
                }
            }
        })
        .expect("run completes");
}

#[test]
fn first_tick_builds_population_and_stock() {
    let config = short_config();
    let target = config.population.target_population;
    let stock_target = config.derived.housing_stock_target;
    let mut engine = SimEngine::new(config, data_table(), 4);

    engine
        .run_observed(|tick, world, models| {
            if tick == 0 {
                assert!(world.population() >= target * 9 / 10, "population {}", world.population());
                assert_eq!(models.construction.housing_stock(), stock_target);
            }
        })
        .expect("run completes");
}

// ── Replicates ──────────────────────────────────────────────────────────────

#[test]
fn keep_last_equals_final_replicate() {
    let mut two = short_config();
    two.run.n_sims = 2;
    two.run.replicate_mode = ReplicateMode::KeepLast;

    let kept = run(two.clone(), 17);
    let again = run(two, 17);
    assert_eq!(kept, again);

    let single = run(short_config(), 17);
    assert_ne!(
        kept, single,
        "second replicate uses its own random stream and should differ from the first"
    );
}

#[test]
fn average_mode_divides_by_replicate_count() {
    let mut keep = short_config();
    keep.run.n_sims = 1;
    let mut avg = short_config();
    avg.run.n_sims = 1;
    avg.run.replicate_mode = ReplicateMode::Average;

    // One replicate: averaging is the identity.
    assert_eq!(run(keep, 5), run(avg.clone(), 5));

    avg.run.n_sims = 2;
    let averaged = run(avg, 5);
    let stock = averaged.column(Metric::HousingStock).expect("housing stock column");
    let single = run(short_config(), 5);
    let single_stock = single.column(Metric::HousingStock).expect("housing stock column");
    // Both replicates build the same initial stock, so the average stays within
    // new-build range of a single replicate.
    for (a, s) in stock.iter().zip(single_stock) {
        assert!((a - s).abs() <= 20.0, "averaged stock {a} vs single {s}");
    }
}

// ── Scheduled shocks ────────────────────────────────────────────────────────

#[test]
fn ltv_shock_fires_once_and_sticks() {
    let mut config = short_config();
    config.scheduled_shocks = vec![ScheduledShock::LtvCap {
        tick: 10,
        ftb: 0.7,
        home_mover: 0.65,
        btl: 0.6,
    }];
    let mut engine = SimEngine::new(config, data_table(), 2);
    let mut before = None;

    engine
        .run_observed(|tick, _, models| {
            if tick == 9 {
                before = Some(models.bank.max_ltv(MortgageKind::FirstTimeBuyer));
            }
        })
        .expect("run completes");

    assert_eq!(engine.shocks_fired(), 1);
    assert_eq!(before, Some(0.95));
    let bank: &dyn Bank = engine.models().bank.as_ref();
    assert_eq!(bank.max_ltv(MortgageKind::FirstTimeBuyer), 0.7);
    assert_eq!(bank.max_ltv(MortgageKind::HomeMover), 0.65);
    assert_eq!(bank.max_ltv(MortgageKind::BuyToLet), 0.6);
}

#[test]
fn income_shock_scales_table_exactly_once() {
    let table = data_table();
    let mut config = short_config();
    config.run.n_sims = 2;
    config.scheduled_shocks = vec![ScheduledShock::IncomeShock {
        tick: 5,
        factor: 1.25,
    }];
    let mut engine = SimEngine::new(config, table.clone(), 3);
    engine.run().expect("run completes");

    assert_eq!(engine.shocks_fired(), 1);
    let world = engine.world().expect("world retained after run");
    for (before, after) in table.bins().iter().zip(world.income.table().bins()) {
        assert!(
            (after.income_max - before.income_max * 1.25).abs() < 1e-6,
            "replicates must not compound the shock: {} -> {}",
            before.income_max,
            after.income_max
        );
    }
}

#[test]
fn shock_outside_run_never_fires() {
    let mut config = short_config();
    config.scheduled_shocks = vec![ScheduledShock::IncomeShock {
        tick: 1_000,
        factor: 2.0,
    }];
    let mut engine = SimEngine::new(config, data_table(), 3);
    engine.run().expect("run completes");
    assert_eq!(engine.shocks_fired(), 0);
}
