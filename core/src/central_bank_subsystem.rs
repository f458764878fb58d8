//! Baseline central bank: when active, tightens the owner-occupier
//! loan-to-income cap while the price-to-income ratio sits above a trigger.

use crate::{
    config::{CentralBankConfig, SimConfig},
    core_indicators::CoreIndicators,
    subsystem::{CentralBank, Policy},
    types::Tick,
};

#[derive(Debug, Clone)]
pub struct BaselineCentralBank {
    config: CentralBankConfig,
    default_oo_lti: f64,
    policy: Policy,
}

impl BaselineCentralBank {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            config: config.central_bank.clone(),
            default_oo_lti: config.bank.max_oo_lti,
            policy: Policy {
                max_oo_lti: config.bank.max_oo_lti,
            },
        }
    }
}

impl CentralBank for BaselineCentralBank {
    fn init(&mut self, config: &SimConfig) {
        *self = Self::new(config);
    }

    fn step(&mut self, tick: Tick, indicators: &CoreIndicators) {
        if !self.config.active {
            return;
        }
        let target = if indicators.price_to_income > self.config.price_to_income_trigger {
            self.config.tightened_oo_lti
        } else {
            self.default_oo_lti
        };
        if target != self.policy.max_oo_lti {
            log::info!(
                "Tick {tick}: central bank sets OO LTI cap to {target:.2} (price/income {:.2})",
                indicators.price_to_income
            );
            self.policy.max_oo_lti = target;
        }
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_central_bank_keeps_default_policy() {
        let config = SimConfig::default_test();
        let mut cb = BaselineCentralBank::new(&config);
        let hot = CoreIndicators {
            price_to_income: 50.0,
            ..CoreIndicators::default()
        };
        cb.step(1, &hot);
        assert_eq!(cb.policy().max_oo_lti, config.bank.max_oo_lti);
    }

    #[test]
    fn active_central_bank_tightens_and_relaxes() {
        let mut config = SimConfig::default_test();
        config.central_bank.active = true;
        let mut cb = BaselineCentralBank::new(&config);

        let hot = CoreIndicators {
            price_to_income: 10.0,
            ..CoreIndicators::default()
        };
        cb.step(1, &hot);
        assert_eq!(cb.policy().max_oo_lti, config.central_bank.tightened_oo_lti);

        cb.step(2, &CoreIndicators::default());
        assert_eq!(cb.policy().max_oo_lti, config.bank.max_oo_lti);
    }
}
