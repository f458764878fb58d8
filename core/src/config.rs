use crate::{
    error::{SimError, SimResult},
    types::{Tick, MONTHS_IN_YEAR},
};
use serde::{Deserialize, Serialize};

/// How the orchestrator combines result series across replicates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplicateMode {
    /// Each replicate overwrites the series; only the last one survives.
    #[default]
    KeepLast,
    /// Series are summed across replicates and divided by N_SIMS.
    Average,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub n_steps: Tick,
    pub time_to_start_recording: Tick,
    pub n_sims: u32,
    #[serde(default)]
    pub replicate_mode: ReplicateMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeDataConfig {
    /// File name under `<data_dir>/income/`.
    pub table_file: String,
    /// Rows per age group; cumulative probability restarts at each group.
    pub rows_per_age_group: usize,
    /// Floor for sampled income, before annualisation.
    pub government_monthly_income_support: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationConfig {
    pub target_population: usize,
    pub initial_age_min: f64,
    pub initial_age_max: f64,
    pub newborn_age_min: f64,
    pub newborn_age_max: f64,
    pub annual_birth_rate: f64,
    /// Annual death probability at age 20.
    pub mortality_base: f64,
    /// Exponential growth of mortality per year of age.
    pub mortality_growth: f64,
    /// Probability a new household carries the BTL trait.
    pub p_investor: f64,
    /// Probability a BTL household forms expectations as a fundamentalist.
    pub p_fundamentalist: f64,
    /// Initial bank balance as a fraction of annual income (upper bound).
    pub initial_balance_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HousingConfig {
    pub n_quality: usize,
    pub houses_per_household: f64,
    /// Reference price of the lowest quality level.
    pub initial_price_q0: f64,
    /// Multiplicative price step per quality level.
    pub price_quality_step: f64,
    /// Gross yield used to price rents before any rental transaction.
    pub initial_rent_yield: f64,
    pub market_average_price_decay: f64,
    pub rent_average_price_decay: f64,
    /// Monthly price cut applied to unsold sale listings.
    pub sale_price_reduction: f64,
    /// Monthly rent cut applied to unlet rental listings.
    pub rent_price_reduction: f64,
    pub tenancy_months_min: u32,
    pub tenancy_months_max: u32,
    pub max_new_builds_per_month: usize,
    /// Fraction of the stock deficit built in one month.
    pub construction_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehaviourConfig {
    pub hpa_expectation_factor: f64,
    pub fundamentalist_cap_gain_coeff: f64,
    pub trend_cap_gain_coeff: f64,
    pub hpa_years_to_check: u32,
    pub desired_rent_income_fraction: f64,
    pub psychological_cost_of_renting: f64,
    pub sensitivity_rent_or_purchase: f64,
    pub bank_balance_for_cash_downpayment: f64,
    pub buy_scale: f64,
    pub desired_bank_balance_alpha: f64,
    pub desired_bank_balance_beta: f64,
    /// Fraction of balance above the desired level consumed each month.
    pub consumption_fraction: f64,
    /// Fraction of monthly income spent on essentials.
    pub essential_consumption_fraction: f64,
    pub decision_to_sell_alpha: f64,
    pub btl_choice_intensity: f64,
    /// Scales `decision_to_sell_alpha` into a monthly sale probability.
    pub btl_sell_scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankConfig {
    pub base_rate: f64,
    pub initial_spread: f64,
    pub min_spread: f64,
    pub max_spread: f64,
    /// Spread change per unit of relative credit excess.
    pub spread_adjustment: f64,
    /// Target new credit per household per month.
    pub credit_supply_target: f64,
    pub mortgage_duration_years: u32,
    pub max_ftb_ltv: f64,
    pub max_home_mover_ltv: f64,
    pub max_btl_ltv: f64,
    pub max_oo_lti: f64,
    /// Maximum share of monthly income going to mortgage payments.
    pub affordability_coeff: f64,
    /// Minimum expected rent over mortgage payment for BTL loans.
    pub btl_icr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CentralBankConfig {
    pub active: bool,
    pub price_to_income_trigger: f64,
    pub tightened_oo_lti: f64,
}

/// A one-shot intervention applied at the start of an absolute tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduledShock {
    LtvCap {
        tick: Tick,
        ftb: f64,
        home_mover: f64,
        btl: f64,
    },
    IncomeShock {
        tick: Tick,
        factor: f64,
    },
}

impl ScheduledShock {
    pub fn tick(&self) -> Tick {
        match self {
            Self::LtvCap { tick, .. } | Self::IncomeShock { tick, .. } => *tick,
        }
    }
}

/// Values computed from the loaded parameters.
/// Recomputed by `set_derived_params()`; never read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedParams {
    pub recorded_steps: usize,
    pub annual_income_support: f64,
    pub hpa_months_to_check: Tick,
    pub mortgage_term_months: u32,
    pub monthly_birth_probability: f64,
    pub housing_stock_target: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    pub run: RunConfig,
    pub income: IncomeDataConfig,
    pub population: PopulationConfig,
    pub housing: HousingConfig,
    pub behaviour: BehaviourConfig,
    pub bank: BankConfig,
    pub central_bank: CentralBankConfig,
    #[serde(default)]
    pub scheduled_shocks: Vec<ScheduledShock>,
    #[serde(skip)]
    pub derived: DerivedParams,
}

impl SimConfig {
    /// Load from `<data_dir>/config.json`.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> SimResult<Self> {
        let path = format!("{data_dir}/config.json");
        let content = std::fs::read_to_string(&path).map_err(|e| SimError::ConfigLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let mut config: SimConfig = serde_json::from_str(&content)?;
        config.set_derived_params();
        config.validate()?;
        log::debug!("Loaded config from {path}");
        Ok(config)
    }

    /// Path of the income table for this config.
    pub fn income_table_path(&self, data_dir: &str) -> String {
        format!("{data_dir}/income/{}", self.income.table_file)
    }

    /// Recompute every derived field. Must run after overrides are
    /// applied and before any model object is constructed.
    pub fn set_derived_params(&mut self) {
        let recorded = self
            .run
            .n_steps
            .saturating_sub(self.run.time_to_start_recording);
        self.derived = DerivedParams {
            recorded_steps: recorded as usize,
            annual_income_support: self.income.government_monthly_income_support
                * MONTHS_IN_YEAR,
            hpa_months_to_check: self.behaviour.hpa_years_to_check as Tick * 12,
            mortgage_term_months: self.bank.mortgage_duration_years * 12,
            monthly_birth_probability: self.population.annual_birth_rate / MONTHS_IN_YEAR,
            housing_stock_target: (self.population.target_population as f64
                * self.housing.houses_per_household)
                .round() as usize,
        };
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.run.time_to_start_recording >= self.run.n_steps {
            return Err(SimError::InvalidConfig(format!(
                "time_to_start_recording ({}) must be below n_steps ({})",
                self.run.time_to_start_recording, self.run.n_steps
            )));
        }
        if self.run.n_sims == 0 {
            return Err(SimError::InvalidConfig("n_sims must be at least 1".into()));
        }
        if self.population.target_population == 0 {
            return Err(SimError::InvalidConfig(
                "target_population must be positive".into(),
            ));
        }
        if self.housing.n_quality == 0 {
            return Err(SimError::InvalidConfig("n_quality must be positive".into()));
        }
        if self.income.rows_per_age_group == 0 {
            return Err(SimError::InvalidConfig(
                "rows_per_age_group must be positive".into(),
            ));
        }
        if self.housing.tenancy_months_min == 0
            || self.housing.tenancy_months_max < self.housing.tenancy_months_min
        {
            return Err(SimError::InvalidConfig(format!(
                "tenancy range [{}, {}] is empty",
                self.housing.tenancy_months_min, self.housing.tenancy_months_max
            )));
        }
        if self.bank.mortgage_duration_years == 0 {
            return Err(SimError::InvalidConfig(
                "mortgage_duration_years must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Reference price for a quality level before the market has traded it.
    pub fn reference_price(&self, quality: usize) -> f64 {
        self.housing.initial_price_q0 * (1.0 + self.housing.price_quality_step).powi(quality as i32)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let mut config = Self {
            run: RunConfig {
                n_steps: 120,
                time_to_start_recording: 100,
                n_sims: 1,
                replicate_mode: ReplicateMode::KeepLast,
            },
            income: IncomeDataConfig {
                table_file: "IncomeGivenAge.csv".into(),
                rows_per_age_group: 16,
                government_monthly_income_support: 492.0,
            },
            population: PopulationConfig {
                target_population: 300,
                initial_age_min: 18.0,
                initial_age_max: 80.0,
                newborn_age_min: 18.0,
                newborn_age_max: 28.0,
                annual_birth_rate: 0.012,
                mortality_base: 0.0006,
                mortality_growth: 0.085,
                p_investor: 0.16,
                p_fundamentalist: 0.5,
                initial_balance_fraction: 0.6,
            },
            housing: HousingConfig {
                n_quality: 16,
                houses_per_household: 0.98,
                initial_price_q0: 90_000.0,
                price_quality_step: 0.06,
                initial_rent_yield: 0.05,
                market_average_price_decay: 0.25,
                rent_average_price_decay: 0.25,
                sale_price_reduction: 0.02,
                rent_price_reduction: 0.03,
                tenancy_months_min: 12,
                tenancy_months_max: 24,
                max_new_builds_per_month: 10,
                construction_rate: 0.1,
            },
            behaviour: BehaviourConfig {
                hpa_expectation_factor: 0.5,
                fundamentalist_cap_gain_coeff: 0.5,
                trend_cap_gain_coeff: 0.9,
                hpa_years_to_check: 1,
                desired_rent_income_fraction: 0.33,
                psychological_cost_of_renting: 0.1,
                sensitivity_rent_or_purchase: 4.0,
                bank_balance_for_cash_downpayment: 0.8,
                buy_scale: 4.0,
                desired_bank_balance_alpha: -32.0013877,
                desired_bank_balance_beta: 4.07,
                consumption_fraction: 0.5,
                essential_consumption_fraction: 0.6,
                decision_to_sell_alpha: 4.0,
                btl_choice_intensity: 50.0,
                btl_sell_scale: 0.002,
            },
            bank: BankConfig {
                base_rate: 0.005,
                initial_spread: 0.03,
                min_spread: 0.005,
                max_spread: 0.08,
                spread_adjustment: 0.0005,
                credit_supply_target: 380.0,
                mortgage_duration_years: 25,
                max_ftb_ltv: 0.95,
                max_home_mover_ltv: 0.9,
                max_btl_ltv: 0.75,
                max_oo_lti: 4.5,
                affordability_coeff: 0.4,
                btl_icr: 1.25,
            },
            central_bank: CentralBankConfig {
                active: false,
                price_to_income_trigger: 6.0,
                tightened_oo_lti: 3.5,
            },
            scheduled_shocks: vec![],
            derived: DerivedParams::default(),
        };
        config.set_derived_params();
        config
    }
}
