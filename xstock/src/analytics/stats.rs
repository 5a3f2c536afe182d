//! Statistics primitives.

use statrs::statistics::Statistics;
use thiserror::Error;

/// A statistical precondition was not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("insufficient data for {what}: need at least {required} values, got {actual}")]
    InsufficientData {
        what: &'static str,
        required: usize,
        actual: usize,
    },
}

fn require(what: &'static str, required: usize, actual: usize) -> Result<(), StatsError> {
    if actual < required {
        return Err(StatsError::InsufficientData {
            what,
            required,
            actual,
        });
    }
    Ok(())
}

/// Natural log of each end/start price ratio, newest interval first.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>, StatsError> {
    require("log returns", 2, prices.len())?;

    Ok((1..prices.len())
        .rev()
        .map(|i| (prices[i] / prices[i - 1]).ln())
        .collect())
}

/// Bessel-corrected sample standard deviation.
pub fn sample_std_dev(values: &[f64]) -> Result<f64, StatsError> {
    require("sample standard deviation", 2, values.len())?;
    Ok(values.iter().std_dev())
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    require("median", 1, values.len())?;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let len = sorted.len();
    Ok(if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    })
}

/// Scale a per-period standard deviation to `periods` periods.
pub fn annualize(std_dev: f64, periods: f64) -> f64 {
    std_dev * periods.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_returns_newest_first() {
        let returns = log_returns(&[1.0, 2.0, 4.0, 2.0]).unwrap();
        assert_eq!(returns.len(), 3);
        assert!((returns[0] - 0.5_f64.ln()).abs() < 1e-12);
        assert!((returns[1] - 2.0_f64.ln()).abs() < 1e-12);
        assert!((returns[2] - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_returns_needs_two_prices() {
        assert_eq!(
            log_returns(&[10.0]),
            Err(StatsError::InsufficientData {
                what: "log returns",
                required: 2,
                actual: 1
            })
        );
        assert!(log_returns(&[]).is_err());
    }

    #[test]
    fn test_sample_std_dev_uses_n_minus_one() {
        // mean 5, squared deviations sum 32, / (8 - 1)
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_dev_rejects_short_input() {
        assert!(sample_std_dev(&[]).is_err());
        assert!(sample_std_dev(&[1.0]).is_err());
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[14.0, 10.0, 12.0]).unwrap(), 12.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert!(median(&[]).is_err());
    }

    #[test]
    fn test_annualize() {
        assert_eq!(annualize(0.02, 1.0), 0.02);
        assert!((annualize(0.01, 250.0) - 0.01 * 250.0_f64.sqrt()).abs() < 1e-15);
    }
}
