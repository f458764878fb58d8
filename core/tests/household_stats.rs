//! Population classification and aggregates.

use housing_core::{
    household::{Household, Occupancy},
    household_stats::{BidderKind, HouseholdStats, MarketPriceStats},
};

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Flat price book: every quality trades at `price`.
struct FlatPrices {
    price: f64,
    unsold_new_build: usize,
}

impl MarketPriceStats for FlatPrices {
    fn exp_av_sale_price_for_quality(&self, _quality: usize) -> f64 {
        self.price
    }

    fn n_unsold_new_build(&self) -> usize {
        self.unsold_new_build
    }
}

fn prices() -> FlatPrices {
    FlatPrices {
        price: 120_000.0,
        unsold_new_build: 2,
    }
}

fn homeless(id: u64, btl: bool) -> Household {
    Household::new(id, 30.0, 0.5, 24_000.0, 1_000.0, btl, false)
}

fn owner(id: u64, btl: bool, extra_houses: usize) -> Household {
    let mut h = homeless(id, btl);
    let home = id as usize * 10;
    h.occupancy = Occupancy::OwnerOccupier { home, quality: 1 };
    h.owned = (0..=extra_houses).map(|i| home + i).collect();
    h
}

fn renter(id: u64, rent: f64) -> Household {
    let mut h = homeless(id, false);
    h.occupancy = Occupancy::Renting {
        home: 500 + id as usize,
        quality: 2,
        monthly_rent: rent,
        months_left: 12,
    };
    h
}

/// One household in each of the six categories, plus a second renter.
fn mixed_population() -> Vec<Household> {
    vec![
        owner(1, true, 2),     // active BTL
        owner(2, true, 0),     // BTL owner-occupier
        homeless(3, true),     // BTL homeless
        owner(4, false, 0),    // non-BTL owner-occupier
        renter(5, 500.0),      // renting
        renter(6, 700.0),      // renting
        homeless(7, false),    // non-BTL homeless
    ]
}

// ── Classification ──────────────────────────────────────────────────────────

#[test]
fn category_counts_sum_to_population() {
    let population = mixed_population();
    let mut stats = HouseholdStats::new();
    stats.record(&population, &prices(), 10);

    assert_eq!(stats.n_active_btl(), 1);
    assert_eq!(stats.n_btl_owner_occupier(), 1);
    assert_eq!(stats.n_btl_homeless(), 1);
    assert_eq!(stats.n_non_btl_owner_occupier(), 1);
    assert_eq!(stats.n_renting(), 2);
    assert_eq!(stats.n_non_btl_homeless(), 1);
    assert_eq!(stats.n_classified() as usize, population.len());
    assert_eq!(stats.population(), population.len());
    assert_eq!(stats.n_btl(), 3);
    assert_eq!(stats.n_owner_occupier(), 2);
    assert_eq!(stats.n_homeless(), 2);
    assert_eq!(stats.n_non_owner(), 4);
}

#[test]
fn incomes_are_annualised_once() {
    let population = mixed_population();
    let mut stats = HouseholdStats::new();
    stats.record(&population, &prices(), 10);

    // Every household earns 24k a year.
    assert!((stats.active_btl_annualised_total_income() - 24_000.0).abs() < 1e-6);
    assert!((stats.owner_occupier_annualised_total_income() - 48_000.0).abs() < 1e-6);
    assert!((stats.renting_annualised_total_income() - 48_000.0).abs() < 1e-6);
    assert!((stats.homeless_annualised_total_income() - 48_000.0).abs() < 1e-6);
    assert!((stats.all_annualised_total_income() - 7.0 * 24_000.0).abs() < 1e-6);
}

#[test]
fn bank_balances_bucket_by_category() {
    let population = mixed_population();
    let mut stats = HouseholdStats::new();
    stats.record(&population, &prices(), 10);

    assert_eq!(stats.bank_bal_btl(), 3_000.0);
    assert_eq!(stats.bank_bal_oo(), 1_000.0);
    assert_eq!(stats.bank_bal_rent(), 2_000.0);
    assert_eq!(stats.bank_bal_homeless(), 1_000.0);
    assert_eq!(stats.bank_bal_all(), 7_000.0);
}

// ── Yields ──────────────────────────────────────────────────────────────────

#[test]
fn average_yield_over_renters() {
    let mut stats = HouseholdStats::new();
    stats.record(&mixed_population(), &prices(), 10);
    let expected = (500.0 * 12.0 / 120_000.0 + 700.0 * 12.0 / 120_000.0) / 2.0;
    assert!((stats.av_stock_yield() - expected).abs() < 1e-12);
}

#[test]
fn average_yield_is_zero_without_renters() {
    let population = vec![owner(1, false, 0), homeless(2, false)];
    let mut stats = HouseholdStats::new();
    stats.record(&population, &prices(), 5);
    assert_eq!(stats.av_stock_yield(), 0.0);
}

#[test]
fn non_positive_price_adds_no_yield() {
    let population = vec![renter(1, 600.0)];
    let zero = FlatPrices {
        price: 0.0,
        unsold_new_build: 0,
    };
    let mut stats = HouseholdStats::new();
    stats.record(&population, &zero, 5);
    assert_eq!(stats.n_renting(), 1);
    assert_eq!(stats.sum_stock_yield(), 0.0);
}

// ── Bankruptcy ──────────────────────────────────────────────────────────────

#[test]
fn newly_bankrupt_excludes_repeat_cases() {
    let mut first_time = homeless(1, false);
    first_time.bankrupt = true;
    let mut repeat = homeless(2, false);
    repeat.bankrupt = true;
    repeat.was_bankrupt = true;
    let mut btl = homeless(3, true);
    btl.bankrupt = true;

    let mut stats = HouseholdStats::new();
    stats.record(&[first_time, repeat, btl], &prices(), 5);

    assert_eq!(stats.n_non_btl_bankruptcies(), 2);
    assert_eq!(stats.n_non_btl_new_bankruptcies(), 1);
    assert_eq!(stats.n_btl_bankruptcies(), 1);
    assert!(stats.n_non_btl_new_bankruptcies() <= stats.n_non_btl_bankruptcies());
}

// ── Derived ─────────────────────────────────────────────────────────────────

#[test]
fn empty_houses_and_btl_stock_fraction() {
    let population = mixed_population();
    let mut stats = HouseholdStats::new();
    stats.record(&population, &prices(), 10);

    // 10 houses + 2 homeless - 7 households
    assert_eq!(stats.n_empty_houses(), 5);
    // (5 empty - 2 unsold new builds + 2 renting) / 10
    assert!((stats.btl_stock_fraction() - 0.5).abs() < 1e-12);
}

#[test]
fn snapshot_is_stable_between_records() {
    let population = mixed_population();
    let mut stats = HouseholdStats::new();
    stats.record(&population, &prices(), 10);
    let first = stats.snapshot().clone();

    stats.count_bid_above_exp_av_sale_price(BidderKind::NonBtl, 1e9, &prices());
    assert_eq!(stats.snapshot(), &first);
    assert_eq!(stats.btl_stock_fraction(), stats.btl_stock_fraction());
}

// ── Bid counters ────────────────────────────────────────────────────────────

#[test]
fn bid_counters_publish_previous_window_only() {
    let p = prices();
    let mut stats = HouseholdStats::new();

    stats.count_bid_above_exp_av_sale_price(BidderKind::NonBtl, 150_000.0, &p);
    stats.count_bid_above_exp_av_sale_price(BidderKind::NonBtl, 120_000.0, &p);
    stats.count_bid_above_exp_av_sale_price(BidderKind::NonBtl, 90_000.0, &p);
    stats.count_bid_above_exp_av_sale_price(BidderKind::Btl, 200_000.0, &p);
    assert_eq!(
        stats.n_non_btl_bids_above_exp_av_sale_price(),
        0,
        "partially accumulated counts must not be visible"
    );

    stats.record(std::iter::empty(), &p, 0);
    assert_eq!(stats.n_non_btl_bids_above_exp_av_sale_price(), 2);
    assert_eq!(stats.n_btl_bids_above_exp_av_sale_price(), 1);

    stats.count_bid_above_exp_av_sale_price(BidderKind::Btl, 300_000.0, &p);
    assert_eq!(stats.n_btl_bids_above_exp_av_sale_price(), 1);

    stats.record(std::iter::empty(), &p, 0);
    assert_eq!(stats.n_non_btl_bids_above_exp_av_sale_price(), 0);
    assert_eq!(stats.n_btl_bids_above_exp_av_sale_price(), 1);
}
