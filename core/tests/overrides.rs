//! Parameter override application and derived-parameter refresh.

use housing_core::{
    config::SimConfig,
    overrides::{ParamOverrides, INT_OVERRIDE_SENTINEL, OVERRIDE_SENTINEL},
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn all_sentinels() -> [f64; 14] {
    let mut values = [OVERRIDE_SENTINEL; 14];
    values[5] = INT_OVERRIDE_SENTINEL;
    values
}

// ── Sentinels ───────────────────────────────────────────────────────────────

#[test]
fn sentinels_leave_config_untouched() {
    let mut config = SimConfig::default_test();
    let before = config.clone();

    let applied = ParamOverrides::default().apply(&mut config);
    config.set_derived_params();

    assert!(applied.is_empty(), "nothing should be applied, got {applied:?}");
    assert_eq!(config, before);
}

#[test]
fn positional_sentinels_match_default() {
    assert_eq!(
        ParamOverrides::from_positional(all_sentinels()),
        ParamOverrides::default()
    );
}

// ── Overwrites ──────────────────────────────────────────────────────────────

#[test]
fn non_sentinel_value_overwrites_field() {
    let mut config = SimConfig::default_test();
    let mut overrides = ParamOverrides::default();
    overrides.buy_scale = 3.5;
    overrides.market_average_price_decay = 0.1;
    overrides.p_fundamentalist = 0.0;

    let applied = overrides.apply(&mut config);

    assert_eq!(config.behaviour.buy_scale, 3.5);
    assert_eq!(config.housing.market_average_price_decay, 0.1);
    assert_eq!(
        config.population.p_fundamentalist, 0.0,
        "zero is a real value for a double override"
    );
    assert_eq!(applied.len(), 3);
    assert!(applied.contains(&"buy_scale"));
}

#[test]
fn positional_values_land_in_named_fields() {
    let mut values = all_sentinels();
    values[10] = 2.0; // buy_scale
    values[13] = 12.0; // btl_choice_intensity
    let overrides = ParamOverrides::from_positional(values);

    let mut config = SimConfig::default_test();
    overrides.apply(&mut config);
    assert_eq!(config.behaviour.buy_scale, 2.0);
    assert_eq!(config.behaviour.btl_choice_intensity, 12.0);
    assert_eq!(
        config.behaviour.decision_to_sell_alpha,
        SimConfig::default_test().behaviour.decision_to_sell_alpha
    );
}

// ── Integer-valued overrides ────────────────────────────────────────────────

#[test]
fn hpa_years_sentinel_is_zero() {
    let mut untouched = SimConfig::default_test();
    let applied = ParamOverrides::default().apply(&mut untouched);
    assert!(applied.is_empty());
    assert_eq!(untouched.behaviour.hpa_years_to_check, 1);
}

#[test]
fn hpa_years_below_one_keeps_default() {
    for value in [OVERRIDE_SENTINEL, -3.0, 0.5] {
        let mut config = SimConfig::default_test();
        let mut overrides = ParamOverrides::default();
        overrides.hpa_years_to_check = value;

        let applied = overrides.apply(&mut config);
        assert!(applied.is_empty(), "{value} should not be applied");
        assert_eq!(config.behaviour.hpa_years_to_check, 1, "{value} changed the lookback");
    }
}

#[test]
fn hpa_years_truncates_and_refreshes_derived() {
    let mut config = SimConfig::default_test();
    assert_eq!(config.derived.hpa_months_to_check, 12);

    let mut overrides = ParamOverrides::default();
    overrides.hpa_years_to_check = 2.7;
    overrides.apply(&mut config);
    assert_eq!(config.behaviour.hpa_years_to_check, 2);

    // Derived values are stale until recomputed.
    assert_eq!(config.derived.hpa_months_to_check, 12);
    config.set_derived_params();
    assert_eq!(config.derived.hpa_months_to_check, 24);
}

// ── Names ───────────────────────────────────────────────────────────────────

#[test]
fn set_by_name_accepts_every_listed_name() {
    for (i, name) in ParamOverrides::NAMES.iter().enumerate() {
        let mut overrides = ParamOverrides::default();
        assert!(overrides.set(name, 1.0 + i as f64), "{name} rejected");
        assert_ne!(overrides, ParamOverrides::default(), "{name} did not change anything");
    }
}

#[test]
fn set_rejects_unknown_name() {
    let mut overrides = ParamOverrides::default();
    assert!(!overrides.set("mortgage_rate", 0.5));
    assert_eq!(overrides, ParamOverrides::default());
}

#[test]
fn partial_json_keeps_remaining_sentinels() {
    let overrides: ParamOverrides =
        serde_json::from_str(r#"{ "buy_scale": 5.0 }"#).expect("valid json");
    assert_eq!(overrides.buy_scale, 5.0);
    assert_eq!(overrides.p_fundamentalist, OVERRIDE_SENTINEL);
    assert_eq!(overrides.hpa_years_to_check, INT_OVERRIDE_SENTINEL);
}
