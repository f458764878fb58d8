//! Result payload layout and failure degradation.

use housing_core::{
    config::SimConfig,
    error::SimError,
    headless,
    income::IncomeTable,
    results::{payload_or_sentinel, Metric, Quartile, ResultMatrix, N_METRICS, SENTINEL_PAYLOAD},
    ParamOverrides,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn data_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../data")
}

fn data_table() -> IncomeTable {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/income/IncomeGivenAge.csv");
    IncomeTable::load(path, 16).expect("income table loads")
}

fn simulate(seed: u64) -> ResultMatrix {
    headless::simulate(SimConfig::default_test(), data_table(), seed, &ParamOverrides::default())
        .expect("run completes")
}

// ── Layout ──────────────────────────────────────────────────────────────────

#[test]
fn payload_has_every_series_over_the_recording_window() {
    let config = SimConfig::default_test();
    let expected_len = (config.run.n_steps - config.run.time_to_start_recording) as usize;

    let bytes = headless::run_with(config, data_table(), 3, &ParamOverrides::default())
        .expect("run completes");
    assert_ne!(bytes, SENTINEL_PAYLOAD.to_vec());

    let matrix = ResultMatrix::decode(&bytes).expect("payload decodes");
    assert_eq!(matrix.columns().len(), N_METRICS);
    for (name, series) in matrix.named() {
        assert_eq!(series.len(), expected_len, "{name} has wrong length");
        assert!(series.iter().all(|v| v.is_finite()), "{name} has a non-finite value");
    }
}

#[test]
fn occupancy_series_cover_a_live_population() {
    let matrix = simulate(5);
    let col = |m: Metric| matrix.column(m).expect("column present").to_vec();
    let homeless = col(Metric::NHomeless);
    let renting = col(Metric::NRenting);
    let owners = col(Metric::NOwnerOccupier);
    let stock = col(Metric::HousingStock);
    for t in 0..homeless.len() {
        let housed = renting[t] + owners[t];
        assert!(housed + homeless[t] > 0.0, "recorded step {t}: nobody alive");
        assert!(housed <= stock[t], "recorded step {t}: {housed} housed in {} houses", stock[t]);
    }
}

#[test]
fn quartile_sale_price_is_zero_only_without_sales() {
    let matrix = simulate(13);
    for q in [Quartile::Q1, Quartile::Q2, Quartile::Q3, Quartile::Q4] {
        let prices = matrix.column(Metric::SalePrice(q)).expect("sale price column");
        let counts = matrix.column(Metric::SaleCount(q)).expect("sale count column");
        for (t, (&price, &count)) in prices.iter().zip(counts).enumerate() {
            assert_eq!(
                price > 0.0,
                count > 0.0,
                "quartile {} step {t}: price {price} with {count} sales",
                q.index()
            );
        }
    }
}

// ── Failure paths ───────────────────────────────────────────────────────────

#[test]
fn encoding_failure_degrades_to_sentinel() {
    let err = SimError::Serialization(Box::new(bincode::ErrorKind::Custom("boom".into())));
    let bytes = payload_or_sentinel(Err(err));
    assert_eq!(bytes, vec![0u8]);
    assert!(ResultMatrix::decode(&bytes).is_err(), "sentinel must not decode as results");
}

#[test]
fn missing_data_dir_is_a_config_load_error() {
    let err = headless::run("/nonexistent/data", 1, &ParamOverrides::default()).unwrap_err();
    assert!(matches!(err, SimError::ConfigLoad { .. }), "got {err:?}");
}

#[test]
fn shipped_data_dir_loads() {
    let config = SimConfig::load(data_dir()).expect("shipped config loads");
    let table = IncomeTable::load(
        &config.income_table_path(data_dir()),
        config.income.rows_per_age_group,
    )
    .expect("shipped income table loads");
    assert!(!table.bins().is_empty());
    assert_eq!(config.scheduled_shocks.len(), 1);
}

#[test]
fn empty_recording_window_is_rejected() {
    let mut config = SimConfig::default_test();
    config.run.time_to_start_recording = config.run.n_steps;
    let err = headless::simulate(config, data_table(), 1, &ParamOverrides::default()).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfig(_)), "got {err:?}");
}
