//! Configuration management for xstock.
//!
//! The configuration lives in a single file at `~/.xstock/config.json`.
//!
//! # Configuration Priority
//!
//! Later layers win: defaults < config file < `XSTOCK_*` environment
//! variables.
//!
//! # Environment Variable Mapping
//!
//! - `XSTOCK_LOG_LEVEL` → observability.log_level
//! - `XSTOCK_LOG_FORMAT` → observability.log_format
//! - `XSTOCK_SNAPSHOT_DIR` → data.snapshot_dir
//! - `XSTOCK_PRICE_SOURCE` → data.price_source
//! - `XSTOCK_OUTPUT_DIR` → report.output_dir
//! - `XSTOCK_CONCURRENCY` → report.concurrency

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Report formats understood by the exporter.
pub const SUPPORTED_FORMATS: &[&str] = &["markdown", "md", "json"];

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".xstock"),
        |dirs| dirs.home_dir().join(".xstock"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Data source configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Report run configuration
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("XSTOCK_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("XSTOCK_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(dir) = lookup("XSTOCK_SNAPSHOT_DIR") {
            self.data.snapshot_dir = PathBuf::from(dir);
        }
        if let Some(source) = lookup("XSTOCK_PRICE_SOURCE") {
            match source.to_lowercase().as_str() {
                "snapshot" => self.data.price_source = PriceSource::Snapshot,
                "eniu" => self.data.price_source = PriceSource::Eniu,
                other => tracing::warn!(value = other, "Ignoring unknown XSTOCK_PRICE_SOURCE"),
            }
        }
        if let Some(dir) = lookup("XSTOCK_OUTPUT_DIR") {
            self.report.output_dir = PathBuf::from(dir);
        }
        if let Some(concurrency) = lookup("XSTOCK_CONCURRENCY") {
            if let Ok(n) = concurrency.parse() {
                self.report.concurrency = n;
            }
        }
    }

    /// Reject configurations that cannot produce a report.
    pub fn validate(&self) -> crate::Result<()> {
        self.report.validate()
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets pinned to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Data Configuration
// ============================================================================

/// Where historical prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Read from the per-security snapshot file
    #[default]
    Snapshot,
    /// Fetch from the eniu.com chart endpoint
    Eniu,
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `securities.json` and one `<secucode>.json` per security
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Historical price source
    #[serde(default)]
    pub price_source: PriceSource,

    /// Base URL of the eniu price endpoint
    #[serde(default = "default_eniu_base_url")]
    pub eniu_base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Request budget for eniu
    #[serde(default = "default_eniu_requests_per_minute")]
    pub eniu_requests_per_minute: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            price_source: PriceSource::default(),
            eniu_base_url: default_eniu_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            eniu_requests_per_minute: default_eniu_requests_per_minute(),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    config_dir().join("snapshots")
}

fn default_eniu_base_url() -> String {
    "https://eniu.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_eniu_requests_per_minute() -> u32 {
    60
}

// ============================================================================
// Report Configuration
// ============================================================================

/// Report run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Security codes to include (e.g. "600519.SH"). Empty means every listed security.
    #[serde(default)]
    pub securities: Vec<String>,

    /// Directory reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output formats ("markdown", "json")
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,

    /// Maximum number of securities aggregated at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Volatility interval name (DAY, WEEK, MONTH, YEAR)
    #[serde(default = "default_volatility_interval")]
    pub volatility_interval: String,

    /// Report view thresholds
    #[serde(default)]
    pub thresholds: ViewThresholds,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            securities: Vec::new(),
            output_dir: default_output_dir(),
            formats: default_formats(),
            concurrency: default_concurrency(),
            volatility_interval: default_volatility_interval(),
            thresholds: ViewThresholds::default(),
        }
    }
}

impl ReportConfig {
    fn validate(&self) -> crate::Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("report.concurrency must be at least 1".into()));
        }
        if self.formats.is_empty() {
            return Err(Error::Config("report.formats must not be empty".into()));
        }
        if let Some(unknown) = self
            .formats
            .iter()
            .find(|f| !SUPPORTED_FORMATS.contains(&f.to_lowercase().as_str()))
        {
            return Err(Error::Config(format!("unknown report format: {}", unknown)));
        }
        self.thresholds.validate()
    }
}

fn default_output_dir() -> PathBuf {
    config_dir().join("reports")
}

fn default_formats() -> Vec<String> {
    vec!["markdown".to_string()]
}

fn default_concurrency() -> usize {
    8
}

fn default_volatility_interval() -> String {
    "YEAR".to_string()
}

/// Boundaries of the price and volatility report views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewThresholds {
    /// Stocks priced at or below this go to the low-price view
    #[serde(default = "default_low_price_ceiling")]
    pub low_price_ceiling: f64,

    /// Upper bound (inclusive) of the low volatility band
    #[serde(default = "default_low_volatility_ceiling")]
    pub low_volatility_ceiling: f64,

    /// Upper bound (inclusive) of the moderate band; above is high volatility
    #[serde(default = "default_high_volatility_floor")]
    pub high_volatility_floor: f64,
}

impl Default for ViewThresholds {
    fn default() -> Self {
        Self {
            low_price_ceiling: default_low_price_ceiling(),
            low_volatility_ceiling: default_low_volatility_ceiling(),
            high_volatility_floor: default_high_volatility_floor(),
        }
    }
}

impl ViewThresholds {
    fn validate(&self) -> crate::Result<()> {
        let values = [
            self.low_price_ceiling,
            self.low_volatility_ceiling,
            self.high_volatility_floor,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::Config(
                "report.thresholds must be finite and non-negative".into(),
            ));
        }
        if self.low_volatility_ceiling > self.high_volatility_floor {
            return Err(Error::Config(format!(
                "report.thresholds: low volatility ceiling {} exceeds high volatility floor {}",
                self.low_volatility_ceiling, self.high_volatility_floor
            )));
        }
        Ok(())
    }
}

fn default_low_price_ceiling() -> f64 {
    30.0
}

fn default_low_volatility_ceiling() -> f64 {
    0.1
}

fn default_high_volatility_floor() -> f64 {
    0.5
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.data.price_source, PriceSource::Snapshot);
        assert_eq!(config.report.concurrency, 8);
        assert_eq!(config.report.thresholds.low_price_ceiling, 30.0);
        assert_eq!(config.report.thresholds.low_volatility_ceiling, 0.1);
        assert_eq!(config.report.thresholds.high_volatility_floor, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "observability": { "level": "debug" },
                "data": { "price_source": "eniu" },
                "report": { "securities": ["600519.SH"], "formats": ["json", "md"] }
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
        assert_eq!(config.data.price_source, PriceSource::Eniu);
        assert_eq!(config.data.eniu_base_url, "https://eniu.com");
        assert_eq!(config.report.securities, vec!["600519.SH"]);
        assert_eq!(config.report.volatility_interval, "YEAR");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("XSTOCK_LOG_LEVEL", "trace"),
            ("XSTOCK_SNAPSHOT_DIR", "/tmp/snapshots"),
            ("XSTOCK_PRICE_SOURCE", "ENIU"),
            ("XSTOCK_CONCURRENCY", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.observability.log_level, "trace");
        assert_eq!(config.data.snapshot_dir, PathBuf::from("/tmp/snapshots"));
        assert_eq!(config.data.price_source, PriceSource::Eniu);
        assert_eq!(config.report.concurrency, 3);
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "report": { "concurrency": 4, "output_dir": "/srv/reports" } }"#,
        )
        .unwrap();

        let mut config = Config::load_from(&path).unwrap();
        config.apply_overrides_from(|key| {
            (key == "XSTOCK_CONCURRENCY").then(|| "2".to_string())
        });

        assert_eq!(config.report.concurrency, 2);
        assert_eq!(config.report.output_dir, PathBuf::from("/srv/reports"));
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_unparsable_concurrency_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| {
            (key == "XSTOCK_CONCURRENCY").then(|| "many".to_string())
        });
        assert_eq!(config.report.concurrency, 8);
    }

    #[test]
    fn test_validate_rejects_bad_report_config() {
        let mut config = Config::default();
        config.report.concurrency = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.report.formats = vec!["xlsx".to_string()];
        assert!(config.validate().unwrap_err().to_string().contains("xlsx"));

        let mut config = Config::default();
        config.report.thresholds.low_volatility_ceiling = 0.6;
        assert!(config.validate().is_err());
    }
}
