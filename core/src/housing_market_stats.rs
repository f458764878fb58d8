//! Sale-market statistics: pre-clearing (phase 4) and post-clearing
//! (phase 6) records, the exponential moving-average price per quality
//! level, and the house price index history used for HPA expectations.

use crate::{
    config::SimConfig,
    household_stats::MarketPriceStats,
    market::{MortgageKind, SaleBid, SaleRecord},
    types::{quality_quartile, Tick, N_QUARTILES},
    world::World,
};

pub const DAYS_IN_MONTH: f64 = 30.0;

/// Offer-side summary for one quality quartile.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuartileOffers {
    pub count: u32,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Default)]
pub struct HousingMarketStats {
    n_quality: usize,
    decay: f64,
    hpa_months: Tick,
    reference_mean: f64,
    exp_av_sale_price: Vec<f64>,
    hpi_history: Vec<f64>,

    // Pre-clearing.
    n_buyers: u32,
    n_btl_buyers: u32,
    n_sellers: u32,
    av_bid_price: f64,
    av_offer_price: f64,
    offers: [QuartileOffers; N_QUARTILES],

    // Post-clearing.
    n_sales: u32,
    av_sale_price: f64,
    av_days_on_market: f64,
    quartile_sale_price: [f64; N_QUARTILES],
    quartile_sale_count: [u32; N_QUARTILES],
    n_unsold_new_build: usize,
}

impl HousingMarketStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new replicate; moving averages start at reference prices.
    pub fn init(&mut self, config: &SimConfig) {
        let n_quality = config.housing.n_quality;
        let exp_av_sale_price: Vec<f64> =
            (0..n_quality).map(|q| config.reference_price(q)).collect();
        let reference_mean = exp_av_sale_price.iter().sum::<f64>() / n_quality.max(1) as f64;
        *self = Self {
            n_quality,
            decay: config.housing.market_average_price_decay,
            hpa_months: config.derived.hpa_months_to_check,
            reference_mean,
            exp_av_sale_price,
            hpi_history: vec![1.0],
            ..Self::default()
        };
    }

    pub fn pre_clearing_record(&mut self, world: &World, bids: &[SaleBid]) {
        self.n_buyers = bids.len() as u32;
        self.n_btl_buyers = bids
            .iter()
            .filter(|b| b.kind == MortgageKind::BuyToLet)
            .count() as u32;
        self.av_bid_price = mean(bids.iter().map(|b| b.price));

        let mut offers = [QuartileOffers::default(); N_QUARTILES];
        let mut sum = [0.0; N_QUARTILES];
        let mut total = 0.0;
        let mut n_sellers = 0u32;
        for house in &world.houses {
            let Some(listing) = &house.sale else { continue };
            n_sellers += 1;
            total += listing.price;
            let q = quality_quartile(house.quality, self.n_quality) - 1;
            let o = &mut offers[q];
            if o.count == 0 {
                o.min = listing.price;
                o.max = listing.price;
            } else {
                o.min = o.min.min(listing.price);
                o.max = o.max.max(listing.price);
            }
            o.count += 1;
            sum[q] += listing.price;
        }
        for (o, s) in offers.iter_mut().zip(sum) {
            if o.count > 0 {
                o.avg = s / o.count as f64;
            }
        }
        self.n_sellers = n_sellers;
        self.av_offer_price = if n_sellers > 0 { total / n_sellers as f64 } else { 0.0 };
        self.offers = offers;
    }

    pub fn post_clearing_record(&mut self, world: &World, sales: &[SaleRecord]) {
        self.n_sales = sales.len() as u32;
        self.av_sale_price = mean(sales.iter().map(|s| s.price));
        self.av_days_on_market =
            mean(sales.iter().map(|s| s.months_on_market as f64 * DAYS_IN_MONTH));

        let mut price_sum = [0.0; N_QUARTILES];
        let mut count = [0u32; N_QUARTILES];
        for sale in sales {
            let q = quality_quartile(sale.quality, self.n_quality) - 1;
            price_sum[q] += sale.price;
            count[q] += 1;
            if let Some(ema) = self.exp_av_sale_price.get_mut(sale.quality) {
                *ema = self.decay * sale.price + (1.0 - self.decay) * *ema;
            }
        }
        for q in 0..N_QUARTILES {
            self.quartile_sale_price[q] = if count[q] > 0 {
                price_sum[q] / count[q] as f64
            } else {
                0.0
            };
        }
        self.quartile_sale_count = count;

        let hpi = if self.reference_mean > 0.0 {
            mean(self.exp_av_sale_price.iter().copied()) / self.reference_mean
        } else {
            1.0
        };
        self.hpi_history.push(hpi);
        self.n_unsold_new_build = world.n_unsold_new_build();
    }

    pub fn exp_av_sale_price(&self, quality: usize) -> f64 {
        let q = quality.min(self.n_quality.saturating_sub(1));
        self.exp_av_sale_price.get(q).copied().unwrap_or(0.0)
    }

    /// Mean moving-average price across quality levels.
    pub fn mean_exp_av_sale_price(&self) -> f64 {
        mean(self.exp_av_sale_price.iter().copied())
    }

    pub fn hpi(&self) -> f64 {
        self.hpi_history.last().copied().unwrap_or(1.0)
    }

    /// Annualised house price appreciation over the configured lookback.
    /// Zero until enough history exists.
    pub fn long_term_hpa(&self) -> f64 {
        let months = self.hpa_months as usize;
        let n = self.hpi_history.len();
        if months == 0 || n <= months {
            return 0.0;
        }
        let then = self.hpi_history[n - 1 - months];
        if then <= 0.0 {
            return 0.0;
        }
        (self.hpi() / then).powf(12.0 / months as f64) - 1.0
    }

    pub fn n_buyers(&self) -> u32 {
        self.n_buyers
    }

    pub fn n_btl_buyers(&self) -> u32 {
        self.n_btl_buyers
    }

    pub fn n_sellers(&self) -> u32 {
        self.n_sellers
    }

    pub fn av_bid_price(&self) -> f64 {
        self.av_bid_price
    }

    pub fn av_offer_price(&self) -> f64 {
        self.av_offer_price
    }

    pub fn n_sales(&self) -> u32 {
        self.n_sales
    }

    pub fn av_sale_price(&self) -> f64 {
        self.av_sale_price
    }

    pub fn av_days_on_market(&self) -> f64 {
        self.av_days_on_market
    }

    /// `quartile` is 1-based.
    pub fn quartile_offers(&self, quartile: usize) -> QuartileOffers {
        self.offers[quartile - 1]
    }

    pub fn quartile_sale_price(&self, quartile: usize) -> f64 {
        self.quartile_sale_price[quartile - 1]
    }

    pub fn quartile_sale_count(&self, quartile: usize) -> u32 {
        self.quartile_sale_count[quartile - 1]
    }
}

impl MarketPriceStats for HousingMarketStats {
    fn exp_av_sale_price_for_quality(&self, quality: usize) -> f64 {
        self.exp_av_sale_price(quality)
    }

    fn n_unsold_new_build(&self) -> usize {
        self.n_unsold_new_build
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hpa_is_zero_without_history() {
        let mut stats = HousingMarketStats::new();
        stats.init(&SimConfig::default_test());
        assert_eq!(stats.long_term_hpa(), 0.0);
        assert_eq!(stats.hpi(), 1.0);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
    }
}
