//! Per-security data model and the collaborators that supply it.
//!
//! Every dataset the report needs arrives from an external collaborator as an
//! already-typed value defined here. Two collaborator implementations ship
//! with the crate:
//!
//! - **snapshot**: a directory of pre-fetched JSON, one file per security
//! - **eniu**: historical daily close prices over HTTP

mod eniu;
mod provider;
mod rate_limiter;
mod snapshot;

pub use eniu::EniuAdapter;
pub use provider::{
    CompanyProfileProvider, DataSources, DisclosureDateProvider, FinancialHistoryProvider,
    OrgRatingProvider, PeHistoryProvider, PriceHistoryProvider, ProfitForecastProvider,
    ProviderError, StockDataProvider, ValuationStatusProvider,
};
pub use rate_limiter::RateLimiter;
pub use snapshot::{SecuritySnapshot, SnapshotStore};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::{self, StatsError};

// ============================================================================
// Security Identity
// ============================================================================

/// Listing entry for one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityIdentity {
    /// Code with exchange suffix (e.g., "600519.SH")
    pub secucode: String,
    /// Security name
    pub name: String,
    /// Industry
    pub industry: String,
    /// Latest price
    pub price: f64,
    /// Weighted ROE (%)
    #[serde(default)]
    pub roe_weight: f64,
}

impl SecurityIdentity {
    /// Bare code without the exchange suffix ("600519.SH" -> "600519").
    pub fn security_code(&self) -> &str {
        self.secucode.split('.').next().unwrap_or(&self.secucode)
    }

    /// Exchange suffix, if the code carries one.
    pub fn exchange(&self) -> Option<&str> {
        self.secucode.split_once('.').map(|(_, exchange)| exchange)
    }
}

// ============================================================================
// Financial History
// ============================================================================

/// Main indicators of one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Period end date
    pub report_date: NaiveDate,
    /// Report name (e.g., "2024一季报")
    #[serde(default)]
    pub report_name: String,
    /// Basic earnings per share
    pub eps: f64,
    /// Weighted ROE (%)
    #[serde(default)]
    pub roe: Option<f64>,
    /// Revenue growth versus the same period last year, as a ratio (0.2 = +20%).
    /// Absent when the quarter has not been disclosed yet.
    #[serde(default)]
    pub revenue_growth_ratio: Option<f64>,
}

/// Reporting periods, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FinancialSnapshot>", into = "Vec<FinancialSnapshot>")]
pub struct FinancialHistory {
    periods: Vec<FinancialSnapshot>,
}

impl FinancialHistory {
    /// Build from periods in any order.
    pub fn new(mut periods: Vec<FinancialSnapshot>) -> Self {
        periods.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        Self { periods }
    }

    /// The most recent period.
    pub fn latest(&self) -> Option<&FinancialSnapshot> {
        self.periods.first()
    }

    /// Basic EPS of the most recent period.
    pub fn latest_eps(&self) -> Option<f64> {
        self.latest().map(|p| p.eps)
    }

    /// Revenue growth ratio of the current quarter, if it has been disclosed.
    pub fn current_quarter_revenue_growth(&self) -> Option<f64> {
        self.latest().and_then(|p| p.revenue_growth_ratio)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FinancialSnapshot> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

impl From<Vec<FinancialSnapshot>> for FinancialHistory {
    fn from(periods: Vec<FinancialSnapshot>) -> Self {
        Self::new(periods)
    }
}

impl From<FinancialHistory> for Vec<FinancialSnapshot> {
    fn from(history: FinancialHistory) -> Self {
        history.periods
    }
}

// ============================================================================
// Valuation
// ============================================================================

/// Composite valuation status plus the qualitative verdict per multiple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationStatus {
    /// Composite score across the valuation multiples
    pub score: f64,
    /// Multiple name (PE, PB, PS, PCF) -> verdict (e.g., "低估", "合理", "高估")
    #[serde(default)]
    pub multiples: BTreeMap<String, String>,
}

/// One trailing PE observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPe {
    pub date: NaiveDate,
    pub pe: f64,
}

/// Trailing PE observations over time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeHistory(pub Vec<HistoricalPe>);

impl PeHistory {
    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|h| h.pe).collect()
    }

    /// Median PE, the security's normal valuation multiple.
    pub fn median(&self) -> Result<f64, StatsError> {
        analytics::median(&self.values())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Price Series
// ============================================================================

/// Reasons a price series is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("price series columns differ in length: {dates} dates, {prices} prices")]
    LengthMismatch { dates: usize, prices: usize },

    #[error("non-positive price {price} on {date}")]
    NonPositivePrice { date: NaiveDate, price: f64 },

    #[error("dates not strictly increasing at {date}")]
    OutOfOrder { date: NaiveDate },
}

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Chronological daily closes, one per trading day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate and wrap chronological points.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (i, point) in points.iter().enumerate() {
            if point.price <= 0.0 || !point.price.is_finite() {
                return Err(SeriesError::NonPositivePrice {
                    date: point.date,
                    price: point.price,
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(SeriesError::OutOfOrder { date: point.date });
            }
        }
        Ok(Self { points })
    }

    /// Build from parallel date and price columns.
    pub fn from_columns(dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self, SeriesError> {
        if dates.len() != prices.len() {
            return Err(SeriesError::LengthMismatch {
                dates: dates.len(),
                prices: prices.len(),
            });
        }
        let points = dates
            .into_iter()
            .zip(prices)
            .map(|(date, price)| PricePoint { date, price })
            .collect();
        Self::new(points)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = SeriesError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

// ============================================================================
// Company, Ratings, Forecasts
// ============================================================================

/// Company profile, passed through to the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company introduction
    #[serde(default)]
    pub introduction: Option<String>,
    /// Main business composition
    #[serde(default)]
    pub main_business: Option<String>,
    /// Any other fields the source provides
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Aggregated institution rating over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgRating {
    /// Period label (e.g., "近一月")
    pub period: String,
    /// Rating (e.g., "买入", "增持")
    pub rating: String,
    /// Number of institutions behind the rating
    #[serde(default)]
    pub org_count: u32,
}

/// Consensus earnings forecast for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitForecast {
    pub year: i32,
    /// Forecast EPS
    pub eps: f64,
    /// Forecast PE
    #[serde(default)]
    pub pe: Option<f64>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(report_date: NaiveDate, eps: f64, growth: Option<f64>) -> FinancialSnapshot {
        FinancialSnapshot {
            report_date,
            report_name: String::new(),
            eps,
            roe: None,
            revenue_growth_ratio: growth,
        }
    }

    #[test]
    fn test_security_code_and_exchange() {
        let identity = SecurityIdentity {
            secucode: "600519.SH".to_string(),
            name: "贵州茅台".to_string(),
            industry: "酿酒行业".to_string(),
            price: 1500.0,
            roe_weight: 30.0,
        };
        assert_eq!(identity.security_code(), "600519");
        assert_eq!(identity.exchange(), Some("SH"));
    }

    #[test]
    fn test_financial_history_sorts_newest_first() {
        let history = FinancialHistory::new(vec![
            snapshot(date(2023, 12, 31), 1.0, Some(0.1)),
            snapshot(date(2024, 3, 31), 0.4, Some(0.2)),
        ]);
        assert_eq!(history.latest_eps(), Some(0.4));
        assert_eq!(history.current_quarter_revenue_growth(), Some(0.2));
    }

    #[test]
    fn test_undisclosed_quarter_has_no_growth() {
        let history = FinancialHistory::new(vec![snapshot(date(2024, 3, 31), 0.4, None)]);
        assert_eq!(history.current_quarter_revenue_growth(), None);
        assert_eq!(FinancialHistory::default().current_quarter_revenue_growth(), None);
    }

    #[test]
    fn test_price_series_rejects_duplicate_dates() {
        let err = PriceSeries::from_columns(vec![date(2024, 1, 2), date(2024, 1, 2)], vec![1.0, 2.0])
            .unwrap_err();
        assert_eq!(err, SeriesError::OutOfOrder { date: date(2024, 1, 2) });
    }

    #[test]
    fn test_price_series_rejects_non_positive_price() {
        let err = PriceSeries::from_columns(vec![date(2024, 1, 2)], vec![0.0]).unwrap_err();
        assert!(matches!(err, SeriesError::NonPositivePrice { .. }));
    }

    #[test]
    fn test_price_series_rejects_length_mismatch() {
        let err = PriceSeries::from_columns(vec![date(2024, 1, 2)], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err, SeriesError::LengthMismatch { dates: 1, prices: 2 });
    }

    #[test]
    fn test_price_series_deserialize_validates() {
        let ok: PriceSeries = serde_json::from_str(
            r#"[{"date":"2024-01-02","price":10.0},{"date":"2024-01-03","price":10.5}]"#,
        )
        .unwrap();
        assert_eq!(ok.prices(), vec![10.0, 10.5]);

        let bad = serde_json::from_str::<PriceSeries>(
            r#"[{"date":"2024-01-03","price":10.0},{"date":"2024-01-02","price":10.5}]"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_company_profile_keeps_unknown_fields() {
        let profile: CompanyProfile = serde_json::from_str(
            r#"{"introduction":"白酒","website":"www.moutaichina.com"}"#,
        )
        .unwrap();
        assert_eq!(profile.introduction.as_deref(), Some("白酒"));
        assert_eq!(profile.extra["website"], "www.moutaichina.com");
    }
}
