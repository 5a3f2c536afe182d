//! Historical volatility.
//!
//! 1. Take the closing price at fixed intervals (day, week, month).
//! 2. For each interval, take the natural log of end price / start price.
//! 3. The sample standard deviation of those logs is the per-interval volatility.
//! 4. Multiply by the square root of the number of intervals in the target
//!    horizon to rescale (250 trading days per year for YEAR).

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::stats::{self, StatsError};
use crate::data::PriceSeries;

/// Horizon the volatility is scaled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Interval {
    Day,
    Week,
    Month,
    Year,
}

impl Interval {
    /// Parse an interval name case-insensitively.
    ///
    /// Unknown names fall back to `Year`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "DAY" => Self::Day,
            "WEEK" => Self::Week,
            "MONTH" => Self::Month,
            "YEAR" => Self::Year,
            other => {
                warn!(interval = other, "Unknown volatility interval, using YEAR");
                Self::Year
            }
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "DAY"),
            Self::Week => write!(f, "WEEK"),
            Self::Month => write!(f, "MONTH"),
            Self::Year => write!(f, "YEAR"),
        }
    }
}

/// Number of daily periods in each interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingTable {
    pub day: f64,
    pub week: f64,
    pub month: f64,
    pub year: f64,
}

impl Default for ScalingTable {
    fn default() -> Self {
        Self {
            day: 1.0,
            week: 5.0,
            month: 21.75,
            year: 250.0,
        }
    }
}

impl ScalingTable {
    pub fn factor(&self, interval: Interval) -> f64 {
        match interval {
            Interval::Day => self.day,
            Interval::Week => self.week,
            Interval::Month => self.month,
            Interval::Year => self.year,
        }
    }
}

/// Converts a price series into interval-scaled volatility.
#[derive(Debug, Clone, Default)]
pub struct VolatilityEstimator {
    scaling: ScalingTable,
}

impl VolatilityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scaling(scaling: ScalingTable) -> Self {
        Self { scaling }
    }

    /// Volatility of `series` scaled to `interval`. Needs at least two prices.
    pub fn estimate(&self, series: &PriceSeries, interval: Interval) -> Result<f64, StatsError> {
        self.estimate_prices(&series.prices(), interval)
    }

    /// Same as [`estimate`](Self::estimate) over raw chronological prices.
    pub fn estimate_prices(&self, prices: &[f64], interval: Interval) -> Result<f64, StatsError> {
        let returns = stats::log_returns(prices)?;
        // A single return has no sample deviation; two prices mean no dispersion.
        let std_dev = if returns.len() == 1 {
            0.0
        } else {
            stats::sample_std_dev(&returns)?
        };
        Ok(stats::annualize(std_dev, self.scaling.factor(interval)))
    }
}
