//! Fixtures shared by unit tests.

use crate::analytics::FairPrice;
use crate::data::{
    CompanyProfile, FinancialHistory, PeHistory, PriceSeries, SecurityIdentity, ValuationStatus,
};
use crate::stock::Stock;

/// A stock with the given listing fields and volatility; everything else empty.
pub fn stock(secucode: &str, industry: &str, price: f64, volatility: f64, roe_weight: f64) -> Stock {
    Stock {
        identity: SecurityIdentity {
            secucode: secucode.to_string(),
            name: format!("{} Co", secucode),
            industry: industry.to_string(),
            price,
            roe_weight,
        },
        financial_history: FinancialHistory::default(),
        valuation: ValuationStatus::default(),
        pe_history: PeHistory::default(),
        fair_price: FairPrice::Undetermined,
        price_history: PriceSeries::default(),
        volatility,
        company_profile: CompanyProfile::default(),
        next_disclosure_date: String::new(),
        org_ratings: Vec::new(),
        profit_forecasts: Vec::new(),
    }
}
