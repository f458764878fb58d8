//! Entry point: one call runs every replicate and returns the payload.
//!
//! Every invocation builds its config, income table, world and models
//! from scratch, so nothing leaks between calls in the same process.
//!
//! Failure semantics:
//!   - config or income table load failure: fatal, nothing is simulated
//!   - a failure inside the tick pipeline: fatal
//!   - payload encoding failure: recovered as `SENTINEL_PAYLOAD`

use crate::{
    config::SimConfig,
    engine::SimEngine,
    error::SimResult,
    income::IncomeTable,
    overrides::ParamOverrides,
    results::{payload_or_sentinel, ResultMatrix},
};

/// Load inputs from `data_dir`, apply `overrides`, simulate, encode.
pub fn run(data_dir: &str, seed: u64, overrides: &ParamOverrides) -> SimResult<Vec<u8>> {
    let config = SimConfig::load(data_dir)?;
    let table = IncomeTable::load(
        &config.income_table_path(data_dir),
        config.income.rows_per_age_group,
    )?;
    run_with(config, table, seed, overrides)
}

/// As `run()`, from inputs already in memory.
pub fn run_with(
    config: SimConfig,
    table: IncomeTable,
    seed: u64,
    overrides: &ParamOverrides,
) -> SimResult<Vec<u8>> {
    let matrix = simulate(config, table, seed, overrides)?;
    Ok(payload_or_sentinel(matrix.encode()))
}

/// Apply overrides, recompute derived parameters and run all replicates.
pub fn simulate(
    mut config: SimConfig,
    table: IncomeTable,
    seed: u64,
    overrides: &ParamOverrides,
) -> SimResult<ResultMatrix> {
    overrides.apply(&mut config);
    config.set_derived_params();
    config.validate()?;

    let mut engine = SimEngine::new(config, table, seed);
    engine.run()
}
