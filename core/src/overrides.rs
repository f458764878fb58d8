//! Whitelisted parameter overrides accepted by the entry point.
//!
//! Every field is a plain `f64`. The sentinel `OVERRIDE_SENTINEL` (or
//! `INT_OVERRIDE_SENTINEL` for integer-valued parameters) means
//! "keep the config default"; any other value overwrites the field.
//! Sentinels are not errors.
//!
//! After `apply()`, callers must run `SimConfig::set_derived_params()`
//! before constructing any model object.

use crate::config::SimConfig;
use serde::{Deserialize, Serialize};

pub const OVERRIDE_SENTINEL: f64 = -1.0;
pub const INT_OVERRIDE_SENTINEL: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOverrides {
    pub market_average_price_decay: f64,
    pub p_fundamentalist: f64,
    pub hpa_expectation_factor: f64,
    pub fundamentalist_cap_gain_coeff: f64,
    pub trend_cap_gain_coeff: f64,
    /// Integer-valued: truncated to whole years. Values below 1, the
    /// sentinel 0 included, keep the default.
    pub hpa_years_to_check: f64,
    pub desired_rent_income_fraction: f64,
    pub psychological_cost_of_renting: f64,
    pub sensitivity_rent_or_purchase: f64,
    pub bank_balance_for_cash_downpayment: f64,
    pub buy_scale: f64,
    pub desired_bank_balance_beta: f64,
    pub decision_to_sell_alpha: f64,
    pub btl_choice_intensity: f64,
}

impl Default for ParamOverrides {
    fn default() -> Self {
        Self {
            market_average_price_decay: OVERRIDE_SENTINEL,
            p_fundamentalist: OVERRIDE_SENTINEL,
            hpa_expectation_factor: OVERRIDE_SENTINEL,
            fundamentalist_cap_gain_coeff: OVERRIDE_SENTINEL,
            trend_cap_gain_coeff: OVERRIDE_SENTINEL,
            hpa_years_to_check: INT_OVERRIDE_SENTINEL,
            desired_rent_income_fraction: OVERRIDE_SENTINEL,
            psychological_cost_of_renting: OVERRIDE_SENTINEL,
            sensitivity_rent_or_purchase: OVERRIDE_SENTINEL,
            bank_balance_for_cash_downpayment: OVERRIDE_SENTINEL,
            buy_scale: OVERRIDE_SENTINEL,
            desired_bank_balance_beta: OVERRIDE_SENTINEL,
            decision_to_sell_alpha: OVERRIDE_SENTINEL,
            btl_choice_intensity: OVERRIDE_SENTINEL,
        }
    }
}

impl ParamOverrides {
    /// Names in positional order, as accepted by `from_positional`.
    pub const NAMES: [&'static str; 14] = [
        "market_average_price_decay",
        "p_fundamentalist",
        "hpa_expectation_factor",
        "fundamentalist_cap_gain_coeff",
        "trend_cap_gain_coeff",
        "hpa_years_to_check",
        "desired_rent_income_fraction",
        "psychological_cost_of_renting",
        "sensitivity_rent_or_purchase",
        "bank_balance_for_cash_downpayment",
        "buy_scale",
        "desired_bank_balance_beta",
        "decision_to_sell_alpha",
        "btl_choice_intensity",
    ];

    /// Build from values in `NAMES` order.
    pub fn from_positional(values: [f64; 14]) -> Self {
        let [a, b, c, d, e, f, g, h, i, j, k, l, m, n] = values;
        Self {
            market_average_price_decay: a,
            p_fundamentalist: b,
            hpa_expectation_factor: c,
            fundamentalist_cap_gain_coeff: d,
            trend_cap_gain_coeff: e,
            hpa_years_to_check: f,
            desired_rent_income_fraction: g,
            psychological_cost_of_renting: h,
            sensitivity_rent_or_purchase: i,
            bank_balance_for_cash_downpayment: j,
            buy_scale: k,
            desired_bank_balance_beta: l,
            decision_to_sell_alpha: m,
            btl_choice_intensity: n,
        }
    }

    /// Set one override by name. Returns false for unknown names.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "market_average_price_decay" => &mut self.market_average_price_decay,
            "p_fundamentalist" => &mut self.p_fundamentalist,
            "hpa_expectation_factor" => &mut self.hpa_expectation_factor,
            "fundamentalist_cap_gain_coeff" => &mut self.fundamentalist_cap_gain_coeff,
            "trend_cap_gain_coeff" => &mut self.trend_cap_gain_coeff,
            "hpa_years_to_check" => &mut self.hpa_years_to_check,
            "desired_rent_income_fraction" => &mut self.desired_rent_income_fraction,
            "psychological_cost_of_renting" => &mut self.psychological_cost_of_renting,
            "sensitivity_rent_or_purchase" => &mut self.sensitivity_rent_or_purchase,
            "bank_balance_for_cash_downpayment" => &mut self.bank_balance_for_cash_downpayment,
            "buy_scale" => &mut self.buy_scale,
            "desired_bank_balance_beta" => &mut self.desired_bank_balance_beta,
            "decision_to_sell_alpha" => &mut self.decision_to_sell_alpha,
            "btl_choice_intensity" => &mut self.btl_choice_intensity,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Write every non-sentinel value into `config`.
    /// Returns the names of the fields that were overwritten.
    pub fn apply(&self, config: &mut SimConfig) -> Vec<&'static str> {
        let mut applied = Vec::new();
        let b = &mut config.behaviour;

        let doubles: [(&'static str, f64, &mut f64); 13] = [
            (
                "market_average_price_decay",
                self.market_average_price_decay,
                &mut config.housing.market_average_price_decay,
            ),
            (
                "p_fundamentalist",
                self.p_fundamentalist,
                &mut config.population.p_fundamentalist,
            ),
            (
                "hpa_expectation_factor",
                self.hpa_expectation_factor,
                &mut b.hpa_expectation_factor,
            ),
            (
                "fundamentalist_cap_gain_coeff",
                self.fundamentalist_cap_gain_coeff,
                &mut b.fundamentalist_cap_gain_coeff,
            ),
            (
                "trend_cap_gain_coeff",
                self.trend_cap_gain_coeff,
                &mut b.trend_cap_gain_coeff,
            ),
            (
                "desired_rent_income_fraction",
                self.desired_rent_income_fraction,
                &mut b.desired_rent_income_fraction,
            ),
            (
                "psychological_cost_of_renting",
                self.psychological_cost_of_renting,
                &mut b.psychological_cost_of_renting,
            ),
            (
                "sensitivity_rent_or_purchase",
                self.sensitivity_rent_or_purchase,
                &mut b.sensitivity_rent_or_purchase,
            ),
            (
                "bank_balance_for_cash_downpayment",
                self.bank_balance_for_cash_downpayment,
                &mut b.bank_balance_for_cash_downpayment,
            ),
            ("buy_scale", self.buy_scale, &mut b.buy_scale),
            (
                "desired_bank_balance_beta",
                self.desired_bank_balance_beta,
                &mut b.desired_bank_balance_beta,
            ),
            (
                "decision_to_sell_alpha",
                self.decision_to_sell_alpha,
                &mut b.decision_to_sell_alpha,
            ),
            (
                "btl_choice_intensity",
                self.btl_choice_intensity,
                &mut b.btl_choice_intensity,
            ),
        ];
        for (name, value, field) in doubles {
            if value != OVERRIDE_SENTINEL {
                *field = value;
                applied.push(name);
            }
        }

        // Whole years only. Anything that truncates below one year, the
        // -1.0 double sentinel included, keeps the default.
        let years = self.hpa_years_to_check.trunc();
        if years >= 1.0 {
            b.hpa_years_to_check = years as u32;
            applied.push("hpa_years_to_check");
        }

        if !applied.is_empty() {
            log::info!("Applied parameter overrides: {}", applied.join(", "));
        }
        applied
    }
}
