//! Result series and the binary payload.
//!
//! PAYLOAD CONTRACT: 88 series, each of length
//! `n_steps - time_to_start_recording`, in the fixed order of
//! `Metric::ALL`. Consumers decode positionally, so the order below
//! never changes:
//!
//!    0-9   market and credit indicators (rent, DTI, LTI, LTV, approvals,
//!          price/income, yield, spread)
//!   10-19  household categories, bankruptcies, housing stock
//!   20-30  registered mortgages, bank balances, annualised incomes
//!   31-39  OO LTV, sale-market prices, volumes and participants
//!   40-47  credit supply and debt service
//!   48-87  four quality quartiles each of: sale price, rent price, sale
//!          count, rent count, principal, installment, offer count,
//!          min / max / average offer
//!
//! The payload is the `bincode` encoding of `Vec<Vec<f64>>`. When
//! encoding fails the entry point returns `SENTINEL_PAYLOAD` instead.

use crate::{
    config::ReplicateMode,
    core_indicators::CoreIndicators,
    credit_supply::CreditSupply,
    error::SimResult,
    household_stats::HouseholdStats,
    housing_market_stats::HousingMarketStats,
    rental_market_stats::RentalMarketStats,
    subsystem::{Bank, Construction},
    types::Tick,
};
use serde::{Deserialize, Serialize};

pub const N_METRICS: usize = 88;

/// Returned in place of the payload when encoding fails.
pub const SENTINEL_PAYLOAD: [u8; 1] = [0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quartile {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quartile {
    /// 1-based index.
    pub fn index(self) -> usize {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    AvRentPrice,
    DebtToIncome,
    OoLti,
    BtlLtv,
    OoDebtToIncome,
    MortgageApprovals,
    DtiBorrowers,
    PriceToIncome,
    RentalYield,
    InterestRateSpread,
    NHomeless,
    NRenting,
    NOwnerOccupier,
    NBtl,
    NNonBtlBankruptcies,
    NBtlBankruptcies,
    HousingStock,
    NNewBuild,
    NEmptyHouses,
    BtlStockFraction,
    NRegisteredMortgages,
    BankBalAll,
    BankBalBtl,
    BankBalOo,
    BankBalRent,
    BankBalHomeless,
    ActiveBtlIncome,
    OwnerOccupierIncome,
    RentingIncome,
    HomelessIncome,
    AllIncome,
    OoLtv,
    AvBidPrice,
    AvOfferPrice,
    AvSalePrice,
    AvDaysOnMarket,
    NBuyers,
    NBtlBuyers,
    NSellers,
    NSales,
    SupplyVal,
    NFtbMortgages,
    NBtlMortgages,
    TotalBtlCredit,
    TotalOoCredit,
    AvgDownpayment,
    OoDsr,
    BtlDsr,
    SalePrice(Quartile),
    RentPrice(Quartile),
    SaleCount(Quartile),
    RentCount(Quartile),
    Principal(Quartile),
    Installment(Quartile),
    SaleOfferCount(Quartile),
    MinSaleOffer(Quartile),
    MaxSaleOffer(Quartile),
    AvgSaleOffer(Quartile),
}

/// Every collaborator a metric can be read from, after a tick completes.
pub struct MetricSources<'a> {
    pub households: &'a HouseholdStats,
    pub housing: &'a HousingMarketStats,
    pub rental: &'a RentalMarketStats,
    pub credit: &'a CreditSupply,
    pub core: &'a CoreIndicators,
    pub bank: &'a dyn Bank,
    pub construction: &'a dyn Construction,
}

impl Metric {
    /// Payload column order.
    pub const ALL: [Metric; N_METRICS] = [
        Metric::AvRentPrice,
        Metric::DebtToIncome,
        Metric::OoLti,
        Metric::BtlLtv,
        Metric::OoDebtToIncome,
        Metric::MortgageApprovals,
        Metric::DtiBorrowers,
        Metric::PriceToIncome,
        Metric::RentalYield,
        Metric::InterestRateSpread,
        Metric::NHomeless,
        Metric::NRenting,
        Metric::NOwnerOccupier,
        Metric::NBtl,
        Metric::NNonBtlBankruptcies,
        Metric::NBtlBankruptcies,
        Metric::HousingStock,
        Metric::NNewBuild,
        Metric::NEmptyHouses,
        Metric::BtlStockFraction,
        Metric::NRegisteredMortgages,
        Metric::BankBalAll,
        Metric::BankBalBtl,
        Metric::BankBalOo,
        Metric::BankBalRent,
        Metric::BankBalHomeless,
        Metric::ActiveBtlIncome,
        Metric::OwnerOccupierIncome,
        Metric::RentingIncome,
        Metric::HomelessIncome,
        Metric::AllIncome,
        Metric::OoLtv,
        Metric::AvBidPrice,
        Metric::AvOfferPrice,
        Metric::AvSalePrice,
        Metric::AvDaysOnMarket,
        Metric::NBuyers,
        Metric::NBtlBuyers,
        Metric::NSellers,
        Metric::NSales,
        Metric::SupplyVal,
        Metric::NFtbMortgages,
        Metric::NBtlMortgages,
        Metric::TotalBtlCredit,
        Metric::TotalOoCredit,
        Metric::AvgDownpayment,
        Metric::OoDsr,
        Metric::BtlDsr,
        Metric::SalePrice(Quartile::Q1),
        Metric::SalePrice(Quartile::Q2),
        Metric::SalePrice(Quartile::Q3),
        Metric::SalePrice(Quartile::Q4),
        Metric::RentPrice(Quartile::Q1),
        Metric::RentPrice(Quartile::Q2),
        Metric::RentPrice(Quartile::Q3),
        Metric::RentPrice(Quartile::Q4),
        Metric::SaleCount(Quartile::Q1),
        Metric::SaleCount(Quartile::Q2),
        Metric::SaleCount(Quartile::Q3),
        Metric::SaleCount(Quartile::Q4),
        Metric::RentCount(Quartile::Q1),
        Metric::RentCount(Quartile::Q2),
        Metric::RentCount(Quartile::Q3),
        Metric::RentCount(Quartile::Q4),
        Metric::Principal(Quartile::Q1),
        Metric::Principal(Quartile::Q2),
        Metric::Principal(Quartile::Q3),
        Metric::Principal(Quartile::Q4),
        Metric::Installment(Quartile::Q1),
        Metric::Installment(Quartile::Q2),
        Metric::Installment(Quartile::Q3),
        Metric::Installment(Quartile::Q4),
        Metric::SaleOfferCount(Quartile::Q1),
        Metric::SaleOfferCount(Quartile::Q2),
        Metric::SaleOfferCount(Quartile::Q3),
        Metric::SaleOfferCount(Quartile::Q4),
        Metric::MinSaleOffer(Quartile::Q1),
        Metric::MinSaleOffer(Quartile::Q2),
        Metric::MinSaleOffer(Quartile::Q3),
        Metric::MinSaleOffer(Quartile::Q4),
        Metric::MaxSaleOffer(Quartile::Q1),
        Metric::MaxSaleOffer(Quartile::Q2),
        Metric::MaxSaleOffer(Quartile::Q3),
        Metric::MaxSaleOffer(Quartile::Q4),
        Metric::AvgSaleOffer(Quartile::Q1),
        Metric::AvgSaleOffer(Quartile::Q2),
        Metric::AvgSaleOffer(Quartile::Q3),
        Metric::AvgSaleOffer(Quartile::Q4),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AvRentPrice => "av_rent_price",
            Self::DebtToIncome => "debt_to_income",
            Self::OoLti => "oo_lti",
            Self::BtlLtv => "btl_ltv",
            Self::OoDebtToIncome => "oo_debt_to_income",
            Self::MortgageApprovals => "mortgage_approvals",
            Self::DtiBorrowers => "dti_borrowers",
            Self::PriceToIncome => "price_to_income",
            Self::RentalYield => "rental_yield",
            Self::InterestRateSpread => "interest_rate_spread",
            Self::NHomeless => "n_homeless",
            Self::NRenting => "n_renting",
            Self::NOwnerOccupier => "n_owner_occupier",
            Self::NBtl => "n_btl",
            Self::NNonBtlBankruptcies => "n_non_btl_bankruptcies",
            Self::NBtlBankruptcies => "n_btl_bankruptcies",
            Self::HousingStock => "housing_stock",
            Self::NNewBuild => "n_new_build",
            Self::NEmptyHouses => "n_empty_houses",
            Self::BtlStockFraction => "btl_stock_fraction",
            Self::NRegisteredMortgages => "n_registered_mortgages",
            Self::BankBalAll => "bank_bal_all",
            Self::BankBalBtl => "bank_bal_btl",
            Self::BankBalOo => "bank_bal_oo",
            Self::BankBalRent => "bank_bal_rent",
            Self::BankBalHomeless => "bank_bal_homeless",
            Self::ActiveBtlIncome => "active_btl_income",
            Self::OwnerOccupierIncome => "owner_occupier_income",
            Self::RentingIncome => "renting_income",
            Self::HomelessIncome => "homeless_income",
            Self::AllIncome => "all_income",
            Self::OoLtv => "oo_ltv",
            Self::AvBidPrice => "av_bid_price",
            Self::AvOfferPrice => "av_offer_price",
            Self::AvSalePrice => "av_sale_price",
            Self::AvDaysOnMarket => "av_days_on_market",
            Self::NBuyers => "n_buyers",
            Self::NBtlBuyers => "n_btl_buyers",
            Self::NSellers => "n_sellers",
            Self::NSales => "n_sales",
            Self::SupplyVal => "supply_val",
            Self::NFtbMortgages => "n_ftb_mortgages",
            Self::NBtlMortgages => "n_btl_mortgages",
            Self::TotalBtlCredit => "total_btl_credit",
            Self::TotalOoCredit => "total_oo_credit",
            Self::AvgDownpayment => "avg_downpayment",
            Self::OoDsr => "oo_dsr",
            Self::BtlDsr => "btl_dsr",
            Self::SalePrice(Quartile::Q1) => "sale_price_q1",
            Self::SalePrice(Quartile::Q2) => "sale_price_q2",
            Self::SalePrice(Quartile::Q3) => "sale_price_q3",
            Self::SalePrice(Quartile::Q4) => "sale_price_q4",
            Self::RentPrice(Quartile::Q1) => "rent_price_q1",
            Self::RentPrice(Quartile::Q2) => "rent_price_q2",
            Self::RentPrice(Quartile::Q3) => "rent_price_q3",
            Self::RentPrice(Quartile::Q4) => "rent_price_q4",
            Self::SaleCount(Quartile::Q1) => "sale_count_q1",
            Self::SaleCount(Quartile::Q2) => "sale_count_q2",
            Self::SaleCount(Quartile::Q3) => "sale_count_q3",
            Self::SaleCount(Quartile::Q4) => "sale_count_q4",
            Self::RentCount(Quartile::Q1) => "rent_count_q1",
            Self::RentCount(Quartile::Q2) => "rent_count_q2",
            Self::RentCount(Quartile::Q3) => "rent_count_q3",
            Self::RentCount(Quartile::Q4) => "rent_count_q4",
            Self::Principal(Quartile::Q1) => "principal_q1",
            Self::Principal(Quartile::Q2) => "principal_q2",
            Self::Principal(Quartile::Q3) => "principal_q3",
            Self::Principal(Quartile::Q4) => "principal_q4",
            Self::Installment(Quartile::Q1) => "installment_q1",
            Self::Installment(Quartile::Q2) => "installment_q2",
            Self::Installment(Quartile::Q3) => "installment_q3",
            Self::Installment(Quartile::Q4) => "installment_q4",
            Self::SaleOfferCount(Quartile::Q1) => "sale_offer_count_q1",
            Self::SaleOfferCount(Quartile::Q2) => "sale_offer_count_q2",
            Self::SaleOfferCount(Quartile::Q3) => "sale_offer_count_q3",
            Self::SaleOfferCount(Quartile::Q4) => "sale_offer_count_q4",
            Self::MinSaleOffer(Quartile::Q1) => "min_sale_offer_q1",
            Self::MinSaleOffer(Quartile::Q2) => "min_sale_offer_q2",
            Self::MinSaleOffer(Quartile::Q3) => "min_sale_offer_q3",
            Self::MinSaleOffer(Quartile::Q4) => "min_sale_offer_q4",
            Self::MaxSaleOffer(Quartile::Q1) => "max_sale_offer_q1",
            Self::MaxSaleOffer(Quartile::Q2) => "max_sale_offer_q2",
            Self::MaxSaleOffer(Quartile::Q3) => "max_sale_offer_q3",
            Self::MaxSaleOffer(Quartile::Q4) => "max_sale_offer_q4",
            Self::AvgSaleOffer(Quartile::Q1) => "avg_sale_offer_q1",
            Self::AvgSaleOffer(Quartile::Q2) => "avg_sale_offer_q2",
            Self::AvgSaleOffer(Quartile::Q3) => "avg_sale_offer_q3",
            Self::AvgSaleOffer(Quartile::Q4) => "avg_sale_offer_q4",
        }
    }

    pub fn read(self, src: &MetricSources<'_>) -> f64 {
        let h = src.households;
        match self {
            Self::AvRentPrice => src.rental.av_rent_price(),
            Self::DebtToIncome => src.core.debt_to_income,
            Self::OoLti => src.core.oo_lti,
            Self::BtlLtv => src.core.btl_ltv,
            Self::OoDebtToIncome => src.core.oo_debt_to_income,
            Self::MortgageApprovals => src.core.mortgage_approvals as f64,
            Self::DtiBorrowers => src.core.dti_borrowers,
            Self::PriceToIncome => src.core.price_to_income,
            Self::RentalYield => src.core.rental_yield,
            Self::InterestRateSpread => src.core.interest_rate_spread,
            Self::NHomeless => h.n_homeless() as f64,
            Self::NRenting => h.n_renting() as f64,
            Self::NOwnerOccupier => h.n_owner_occupier() as f64,
            Self::NBtl => h.n_btl() as f64,
            Self::NNonBtlBankruptcies => h.n_non_btl_bankruptcies() as f64,
            Self::NBtlBankruptcies => h.n_btl_bankruptcies() as f64,
            Self::HousingStock => src.construction.housing_stock() as f64,
            Self::NNewBuild => src.construction.n_new_build() as f64,
            Self::NEmptyHouses => h.n_empty_houses() as f64,
            Self::BtlStockFraction => h.btl_stock_fraction(),
            Self::NRegisteredMortgages => src.credit.n_registered_mortgages() as f64,
            Self::BankBalAll => h.bank_bal_all(),
            Self::BankBalBtl => h.bank_bal_btl(),
            Self::BankBalOo => h.bank_bal_oo(),
            Self::BankBalRent => h.bank_bal_rent(),
            Self::BankBalHomeless => h.bank_bal_homeless(),
            Self::ActiveBtlIncome => h.active_btl_annualised_total_income(),
            Self::OwnerOccupierIncome => h.owner_occupier_annualised_total_income(),
            Self::RentingIncome => h.renting_annualised_total_income(),
            Self::HomelessIncome => h.homeless_annualised_total_income(),
            Self::AllIncome => h.all_annualised_total_income(),
            Self::OoLtv => src.core.oo_ltv,
            Self::AvBidPrice => src.housing.av_bid_price(),
            Self::AvOfferPrice => src.housing.av_offer_price(),
            Self::AvSalePrice => src.housing.av_sale_price(),
            Self::AvDaysOnMarket => src.housing.av_days_on_market(),
            Self::NBuyers => src.housing.n_buyers() as f64,
            Self::NBtlBuyers => src.housing.n_btl_buyers() as f64,
            Self::NSellers => src.housing.n_sellers() as f64,
            Self::NSales => src.housing.n_sales() as f64,
            Self::SupplyVal => src.bank.supply_val(),
            Self::NFtbMortgages => src.credit.n_ftb_mortgages() as f64,
            Self::NBtlMortgages => src.credit.n_btl_mortgages() as f64,
            Self::TotalBtlCredit => src.credit.total_btl_credit(),
            Self::TotalOoCredit => src.credit.total_oo_credit(),
            Self::AvgDownpayment => src.credit.avg_downpayment(),
            Self::OoDsr => src.credit.oo_dsr(),
            Self::BtlDsr => src.credit.btl_dsr(),
            Self::SalePrice(q) => src.housing.quartile_sale_price(q.index()),
            Self::RentPrice(q) => src.rental.quartile_rent_price(q.index()),
            Self::SaleCount(q) => src.housing.quartile_sale_count(q.index()) as f64,
            Self::RentCount(q) => src.rental.quartile_rent_count(q.index()) as f64,
            Self::Principal(q) => src.credit.quartile_principal(q.index()),
            Self::Installment(q) => src.credit.quartile_installment(q.index()),
            Self::SaleOfferCount(q) => src.housing.quartile_offers(q.index()).count as f64,
            Self::MinSaleOffer(q) => src.housing.quartile_offers(q.index()).min,
            Self::MaxSaleOffer(q) => src.housing.quartile_offers(q.index()).max,
            Self::AvgSaleOffer(q) => src.housing.quartile_offers(q.index()).avg,
        }
    }
}

/// Preallocated result columns for one run.
///
/// `KeepLast` overwrites every slot on each replicate, so only the final
/// replicate survives. `Average` sums across replicates and divides at
/// `finish()`.
#[derive(Debug, Clone)]
pub struct ResultRecorder {
    mode: ReplicateMode,
    start: Tick,
    columns: Vec<Vec<f64>>,
    replicates: u32,
}

impl ResultRecorder {
    pub fn new(mode: ReplicateMode, start: Tick, len: usize) -> Self {
        Self {
            mode,
            start,
            columns: vec![vec![0.0; len]; N_METRICS],
            replicates: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn begin_replicate(&mut self) {
        self.replicates += 1;
    }

    /// Write every metric at offset `tick - start`. Ticks outside the
    /// recording window are ignored.
    pub fn record(&mut self, tick: Tick, src: &MetricSources<'_>) {
        if tick < self.start {
            return;
        }
        let offset = (tick - self.start) as usize;
        if offset >= self.len() {
            return;
        }
        for (column, metric) in self.columns.iter_mut().zip(Metric::ALL) {
            let value = metric.read(src);
            match self.mode {
                ReplicateMode::KeepLast => column[offset] = value,
                ReplicateMode::Average => column[offset] += value,
            }
        }
    }

    pub fn finish(self) -> ResultMatrix {
        let mut columns = self.columns;
        if self.mode == ReplicateMode::Average && self.replicates > 1 {
            let n = self.replicates as f64;
            for v in columns.iter_mut().flatten() {
                *v /= n;
            }
        }
        ResultMatrix { columns }
    }
}

/// The 88 result series of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    columns: Vec<Vec<f64>>,
}

impl ResultMatrix {
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn column(&self, metric: Metric) -> Option<&[f64]> {
        let i = Metric::ALL.iter().position(|m| *m == metric)?;
        self.columns.get(i).map(Vec::as_slice)
    }

    /// (name, series) pairs in payload order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, &[f64])> + '_ {
        Metric::ALL
            .into_iter()
            .zip(&self.columns)
            .map(|(m, c)| (m.name(), c.as_slice()))
    }

    pub fn encode(&self) -> SimResult<Vec<u8>> {
        Ok(bincode::serialize(&self.columns)?)
    }

    pub fn decode(bytes: &[u8]) -> SimResult<Self> {
        let columns: Vec<Vec<f64>> = bincode::deserialize(bytes)?;
        Ok(Self { columns })
    }
}

/// Degrade an encoding failure to the sentinel payload.
pub fn payload_or_sentinel(encoded: SimResult<Vec<u8>>) -> Vec<u8> {
    match encoded {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Failed to encode results, returning sentinel payload: {e}");
            SENTINEL_PAYLOAD.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn metric_names_are_unique() {
        let names: HashSet<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), N_METRICS);
    }

    #[test]
    fn column_order_anchors() {
        assert_eq!(Metric::ALL[0].name(), "av_rent_price");
        assert_eq!(Metric::ALL[10].name(), "n_homeless");
        assert_eq!(Metric::ALL[40].name(), "supply_val");
        assert_eq!(Metric::ALL[47].name(), "btl_dsr");
        assert_eq!(Metric::ALL[48].name(), "sale_price_q1");
        assert_eq!(Metric::ALL[87].name(), "avg_sale_offer_q4");
    }
}
