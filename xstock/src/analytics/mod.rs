//! Derived analytics: statistics primitives, historical volatility and fair price.
//!
//! Everything here is a pure function of already-fetched data.

mod stats;
mod valuation;
mod volatility;

pub use stats::{annualize, log_returns, median, sample_std_dev, StatsError};
pub use valuation::{estimate_fair_price, FairPrice};
pub use volatility::{Interval, ScalingTable, VolatilityEstimator};
