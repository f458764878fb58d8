//! Housing market agent-based simulation.
//!
//! `headless::run` is the entry point: seed plus parameter overrides in,
//! binary result payload out. `engine::SimEngine` drives the replicates
//! and the per-tick pipeline.

pub mod bank_subsystem;
pub mod central_bank_subsystem;
pub mod config;
pub mod construction_subsystem;
pub mod core_indicators;
pub mod credit_supply;
pub mod demographics_subsystem;
pub mod engine;
pub mod error;
pub mod headless;
pub mod household;
pub mod household_stats;
pub mod household_subsystem;
pub mod housing_market_stats;
pub mod income;
pub mod market;
pub mod overrides;
pub mod rental_market_stats;
pub mod rental_market_subsystem;
pub mod results;
pub mod rng;
pub mod sale_market_subsystem;
pub mod subsystem;
pub mod types;
pub mod world;

pub use config::SimConfig;
pub use engine::SimEngine;
pub use error::{SimError, SimResult};
pub use overrides::ParamOverrides;
pub use results::{Metric, ResultMatrix};
