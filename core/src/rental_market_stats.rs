//! Rental-market statistics: pre-clearing (phase 7) and post-clearing
//! (phase 9) records plus the moving-average rent per quality level.

use crate::{
    config::SimConfig,
    housing_market_stats::{mean, DAYS_IN_MONTH},
    market::{LetRecord, RentalBid},
    types::{quality_quartile, MONTHS_IN_YEAR, N_QUARTILES},
    world::World,
};

#[derive(Debug, Clone, Default)]
pub struct RentalMarketStats {
    n_quality: usize,
    decay: f64,
    exp_av_rent_price: Vec<f64>,

    n_renters_bidding: u32,
    n_listings: u32,
    av_bid_rent: f64,

    n_lets: u32,
    av_rent_price: f64,
    av_days_on_market: f64,
    quartile_rent_price: [f64; N_QUARTILES],
    quartile_rent_count: [u32; N_QUARTILES],
}

impl RentalMarketStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moving averages start at the initial gross yield on reference prices.
    pub fn init(&mut self, config: &SimConfig) {
        let n_quality = config.housing.n_quality;
        *self = Self {
            n_quality,
            decay: config.housing.rent_average_price_decay,
            exp_av_rent_price: (0..n_quality)
                .map(|q| config.reference_price(q) * config.housing.initial_rent_yield / MONTHS_IN_YEAR)
                .collect(),
            ..Self::default()
        };
    }

    pub fn pre_clearing_record(&mut self, world: &World, bids: &[RentalBid]) {
        self.n_renters_bidding = bids.len() as u32;
        self.av_bid_rent = mean(bids.iter().map(|b| b.price));
        self.n_listings = world.houses.iter().filter(|h| h.rental.is_some()).count() as u32;
    }

    pub fn post_clearing_record(&mut self, lets: &[LetRecord]) {
        self.n_lets = lets.len() as u32;
        self.av_rent_price = mean(lets.iter().map(|l| l.monthly_rent));
        self.av_days_on_market =
            mean(lets.iter().map(|l| l.months_on_market as f64 * DAYS_IN_MONTH));

        let mut sum = [0.0; N_QUARTILES];
        let mut count = [0u32; N_QUARTILES];
        for l in lets {
            let q = quality_quartile(l.quality, self.n_quality) - 1;
            sum[q] += l.monthly_rent;
            count[q] += 1;
            if let Some(ema) = self.exp_av_rent_price.get_mut(l.quality) {
                *ema = self.decay * l.monthly_rent + (1.0 - self.decay) * *ema;
            }
        }
        for q in 0..N_QUARTILES {
            self.quartile_rent_price[q] = if count[q] > 0 { sum[q] / count[q] as f64 } else { 0.0 };
        }
        self.quartile_rent_count = count;
    }

    pub fn exp_av_rent_price(&self, quality: usize) -> f64 {
        let q = quality.min(self.n_quality.saturating_sub(1));
        self.exp_av_rent_price.get(q).copied().unwrap_or(0.0)
    }

    /// Expected gross annual yield on a house of this quality bought at
    /// `price`.
    pub fn expected_gross_yield(&self, quality: usize, price: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        self.exp_av_rent_price(quality) * MONTHS_IN_YEAR / price
    }

    pub fn n_renters_bidding(&self) -> u32 {
        self.n_renters_bidding
    }

    pub fn n_listings(&self) -> u32 {
        self.n_listings
    }

    pub fn av_bid_rent(&self) -> f64 {
        self.av_bid_rent
    }

    pub fn n_lets(&self) -> u32 {
        self.n_lets
    }

    pub fn av_rent_price(&self) -> f64 {
        self.av_rent_price
    }

    pub fn av_days_on_market(&self) -> f64 {
        self.av_days_on_market
    }

    /// `quartile` is 1-based.
    pub fn quartile_rent_price(&self, quartile: usize) -> f64 {
        self.quartile_rent_price[quartile - 1]
    }

    pub fn quartile_rent_count(&self, quartile: usize) -> u32 {
        self.quartile_rent_count[quartile - 1]
    }
}
