//! Fair price estimation.
//!
//! `fair price = median(trailing PE) * latest EPS * (1 + current quarter revenue growth)`
//!
//! The median PE stands in for the multiple the market normally pays for the
//! security; the grown EPS is a rough forward earnings figure.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::stats::StatsError;
use crate::data::PeHistory;

/// Fair price, or the explicit absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum FairPrice {
    Estimated(f64),
    /// The current quarter has not been disclosed, so there is no growth ratio.
    Undetermined,
}

impl FairPrice {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Estimated(v) => Some(*v),
            Self::Undetermined => None,
        }
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, Self::Undetermined)
    }
}

impl fmt::Display for FairPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimated(v) => write!(f, "{:.2}", v),
            Self::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Estimate the fair price of a security.
///
/// A missing growth ratio yields [`FairPrice::Undetermined`] before the PE
/// history is looked at. An empty PE history is an error.
pub fn estimate_fair_price(
    pe_history: &PeHistory,
    latest_eps: f64,
    revenue_growth_ratio: Option<f64>,
) -> Result<FairPrice, StatsError> {
    let Some(growth) = revenue_growth_ratio else {
        return Ok(FairPrice::Undetermined);
    };

    let median_pe = pe_history.median()?;
    Ok(FairPrice::Estimated(median_pe * (latest_eps * (1.0 + growth))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HistoricalPe;
    use chrono::NaiveDate;

    fn pe_history(values: &[f64]) -> PeHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PeHistory(
            values
                .iter()
                .enumerate()
                .map(|(i, pe)| HistoricalPe {
                    date: start + chrono::Days::new(i as u64),
                    pe: *pe,
                })
                .collect(),
        )
    }

    #[test]
    fn test_median_pe_times_grown_eps() {
        let price = estimate_fair_price(&pe_history(&[10.0, 12.0, 14.0]), 1.0, Some(0.2)).unwrap();
        let value = price.value().unwrap();
        assert!((value - 14.4).abs() < 1e-9, "got {}", value);
    }

    #[test]
    fn test_negative_growth_shrinks_estimate() {
        let price = estimate_fair_price(&pe_history(&[20.0]), 2.0, Some(-0.5)).unwrap();
        assert_eq!(price, FairPrice::Estimated(20.0));
    }

    #[test]
    fn test_missing_growth_is_undetermined() {
        let price = estimate_fair_price(&pe_history(&[10.0, 12.0]), 1.0, None).unwrap();
        assert!(price.is_undetermined());
        assert_eq!(price.value(), None);

        // Undetermined wins even without PE history.
        let price = estimate_fair_price(&PeHistory::default(), 1.0, None).unwrap();
        assert_eq!(price, FairPrice::Undetermined);
    }

    #[test]
    fn test_empty_pe_history_is_insufficient() {
        let err = estimate_fair_price(&PeHistory::default(), 1.0, Some(0.1)).unwrap_err();
        assert!(matches!(err, StatsError::InsufficientData { actual: 0, .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(FairPrice::Estimated(14.4).to_string(), "14.40");
        assert_eq!(FairPrice::Undetermined.to_string(), "undetermined");
    }

    #[test]
    fn test_serialization_keeps_sentinel_distinct() {
        let json = serde_json::to_value(FairPrice::Undetermined).unwrap();
        assert_eq!(json, serde_json::json!({"status": "undetermined"}));

        let json = serde_json::to_value(FairPrice::Estimated(1.5)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "estimated", "value": 1.5}));
    }
}
