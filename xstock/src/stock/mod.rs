//! Composite stock records and the aggregator that builds them.
//!
//! A [`Stock`] is assembled from every collaborator's answer for one
//! security, plus the two derived analytics (fair price and historical
//! volatility). Construction is all-or-nothing: either every field is
//! populated or a [`BuildError`] names the step that failed.

mod aggregator;
mod batch;
mod list;

pub use aggregator::StockAggregator;
pub use batch::{BatchFailure, BatchOutcome};
pub use list::StockList;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::analytics::{FairPrice, StatsError};
use crate::data::{
    CompanyProfile, FinancialHistory, OrgRating, PeHistory, PriceSeries, ProfitForecast,
    ProviderError, SecurityIdentity, ValuationStatus,
};

// ============================================================================
// Stock
// ============================================================================

/// Everything the report knows about one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Listing entry (code, name, industry, price, ROE)
    pub identity: SecurityIdentity,
    /// Reporting periods, newest first
    pub financial_history: FinancialHistory,
    /// Composite valuation score and per-multiple verdicts
    pub valuation: ValuationStatus,
    /// Trailing PE observations
    pub pe_history: PeHistory,
    /// Median PE times grown EPS, or undetermined
    pub fair_price: FairPrice,
    /// Daily closes
    pub price_history: PriceSeries,
    /// Historical volatility scaled to the configured interval
    pub volatility: f64,
    pub company_profile: CompanyProfile,
    /// Empty when no disclosure has been scheduled
    pub next_disclosure_date: String,
    pub org_ratings: Vec<OrgRating>,
    pub profit_forecasts: Vec<ProfitForecast>,
}

impl Stock {
    pub fn secucode(&self) -> &str {
        &self.identity.secucode
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn industry(&self) -> &str {
        &self.identity.industry
    }

    pub fn price(&self) -> f64 {
        self.identity.price
    }

    pub fn roe_weight(&self) -> f64 {
        self.identity.roe_weight
    }
}

// ============================================================================
// Build Errors
// ============================================================================

/// The step of [`StockAggregator::build`] that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStep {
    FinancialHistory,
    ValuationStatus,
    PeHistory,
    PriceHistory,
    Volatility,
    FairPrice,
    CompanyProfile,
    DisclosureDate,
    OrgRatings,
    ProfitForecasts,
}

impl BuildStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialHistory => "financial_history",
            Self::ValuationStatus => "valuation_status",
            Self::PeHistory => "pe_history",
            Self::PriceHistory => "price_history",
            Self::Volatility => "volatility",
            Self::FairPrice => "fair_price",
            Self::CompanyProfile => "company_profile",
            Self::DisclosureDate => "disclosure_date",
            Self::OrgRatings => "org_ratings",
            Self::ProfitForecasts => "profit_forecasts",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause of a failed build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildFailure {
    /// A collaborator call could not complete
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A derived value lacked the data it needs
    #[error(transparent)]
    InsufficientData(#[from] StatsError),
}

/// A security could not be built.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{secucode}: {step} failed: {source}")]
pub struct BuildError {
    pub secucode: String,
    pub step: BuildStep,
    #[source]
    pub source: BuildFailure,
}

impl BuildError {
    pub fn new(secucode: impl Into<String>, step: BuildStep, source: impl Into<BuildFailure>) -> Self {
        Self {
            secucode: secucode.into(),
            step,
            source: source.into(),
        }
    }

    /// Whether the failure came from a collaborator rather than a statistic.
    pub fn is_transport(&self) -> bool {
        matches!(self.source, BuildFailure::Provider(_))
    }
}
