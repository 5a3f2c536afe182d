//! Collaborator abstraction for per-security data.
//!
//! Each dataset the aggregator needs is behind its own capability trait so
//! that sources can be mixed: prices from one place, statements from another.
//! `DataSources` bundles one implementation of each.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::{
    CompanyProfile, FinancialHistory, OrgRating, PeHistory, PriceSeries, ProfitForecast,
    SeriesError, ValuationStatus,
};

// ============================================================================
// Provider Error
// ============================================================================

/// Errors raised by data collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, timeout, bad status)
    Network(String),
    /// Rate limit exceeded
    RateLimited { retry_after_secs: Option<u64> },
    /// Data not available for the requested security
    DataNotAvailable(String),
    /// Response could not be parsed into the domain type
    Parse(String),
    /// Invalid request parameters
    InvalidRequest(String),
    /// Internal provider error
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {} seconds", secs)?;
                }
                Ok(())
            }
            Self::DataNotAvailable(msg) => write!(f, "Data not available: {}", msg),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Check if the error is transient (worth retrying at the transport layer)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }
}

impl From<SeriesError> for ProviderError {
    fn from(err: SeriesError) -> Self {
        Self::Parse(err.to_string())
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Historical financial statements, newest first.
#[async_trait]
pub trait FinancialHistoryProvider: Send + Sync {
    async fn fetch_financial_history(&self, secucode: &str)
        -> Result<FinancialHistory, ProviderError>;
}

/// Composite valuation status and per-multiple verdicts.
#[async_trait]
pub trait ValuationStatusProvider: Send + Sync {
    async fn fetch_valuation_status(&self, secucode: &str)
        -> Result<ValuationStatus, ProviderError>;
}

/// Trailing PE history.
#[async_trait]
pub trait PeHistoryProvider: Send + Sync {
    async fn fetch_pe_history(&self, secucode: &str) -> Result<PeHistory, ProviderError>;
}

/// Daily close price history.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_price_history(&self, secucode: &str) -> Result<PriceSeries, ProviderError>;
}

/// Company profile.
#[async_trait]
pub trait CompanyProfileProvider: Send + Sync {
    async fn fetch_company_profile(&self, secucode: &str)
        -> Result<CompanyProfile, ProviderError>;
}

/// Scheduled disclosure date of the next financial report.
///
/// Keyed by the bare security code ("600519"), not the suffixed one.
#[async_trait]
pub trait DisclosureDateProvider: Send + Sync {
    /// Returns an empty string when no date has been scheduled.
    async fn fetch_next_disclosure_date(&self, security_code: &str)
        -> Result<String, ProviderError>;
}

/// Institution rating statistics.
#[async_trait]
pub trait OrgRatingProvider: Send + Sync {
    async fn fetch_org_ratings(&self, secucode: &str) -> Result<Vec<OrgRating>, ProviderError>;
}

/// Consensus profit forecasts.
#[async_trait]
pub trait ProfitForecastProvider: Send + Sync {
    async fn fetch_profit_forecasts(&self, secucode: &str)
        -> Result<Vec<ProfitForecast>, ProviderError>;
}

/// A source able to serve every dataset.
pub trait StockDataProvider:
    FinancialHistoryProvider
    + ValuationStatusProvider
    + PeHistoryProvider
    + PriceHistoryProvider
    + CompanyProfileProvider
    + DisclosureDateProvider
    + OrgRatingProvider
    + ProfitForecastProvider
{
}

impl<T> StockDataProvider for T where
    T: FinancialHistoryProvider
        + ValuationStatusProvider
        + PeHistoryProvider
        + PriceHistoryProvider
        + CompanyProfileProvider
        + DisclosureDateProvider
        + OrgRatingProvider
        + ProfitForecastProvider
{
}

// ============================================================================
// Data Sources
// ============================================================================

/// One collaborator per dataset, injected into the aggregator.
#[derive(Clone)]
pub struct DataSources {
    pub financial_history: Arc<dyn FinancialHistoryProvider>,
    pub valuation_status: Arc<dyn ValuationStatusProvider>,
    pub pe_history: Arc<dyn PeHistoryProvider>,
    pub price_history: Arc<dyn PriceHistoryProvider>,
    pub company_profile: Arc<dyn CompanyProfileProvider>,
    pub disclosure_date: Arc<dyn DisclosureDateProvider>,
    pub org_ratings: Arc<dyn OrgRatingProvider>,
    pub profit_forecasts: Arc<dyn ProfitForecastProvider>,
}

impl DataSources {
    /// Serve every dataset from the same provider.
    pub fn uniform<P: StockDataProvider + 'static>(provider: Arc<P>) -> Self {
        Self {
            financial_history: provider.clone(),
            valuation_status: provider.clone(),
            pe_history: provider.clone(),
            price_history: provider.clone(),
            company_profile: provider.clone(),
            disclosure_date: provider.clone(),
            org_ratings: provider.clone(),
            profit_forecasts: provider,
        }
    }

    /// Replace the price history source.
    pub fn with_price_history(mut self, provider: Arc<dyn PriceHistoryProvider>) -> Self {
        self.price_history = provider;
        self
    }
}

impl fmt::Debug for DataSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSources").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_provider_error_recoverable() {
        assert!(ProviderError::Network("timeout".into()).is_recoverable());
        assert!(ProviderError::RateLimited { retry_after_secs: Some(60) }.is_recoverable());
        assert!(!ProviderError::Parse("bad json".into()).is_recoverable());
        assert!(!ProviderError::DataNotAvailable("no data".into()).is_recoverable());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(err.to_string().contains("30 seconds"));

        let err = ProviderError::Network("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_series_error_becomes_parse_error() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err: ProviderError = SeriesError::OutOfOrder { date }.into();
        assert_eq!(
            err,
            ProviderError::Parse("dates not strictly increasing at 2024-01-02".into())
        );
    }
}
