//! Report export.
//!
//! Renders classified views in two formats:
//! - Markdown (one table per view)
//! - JSON (full records per view)
//!
//! Both end with the securities that could not be built.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::classifier::{ReportClassifier, ReportView, ReportViews};
use crate::stock::{BatchFailure, BatchOutcome, Stock};

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (human-readable)
    Markdown,
    /// JSON format (machine-readable)
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

// ============================================================================
// JSON Shape
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    date: NaiveDate,
    built: usize,
    failed: usize,
    views: Vec<JsonView<'a>>,
    failures: &'a [BatchFailure],
}

#[derive(Serialize)]
struct JsonView<'a> {
    label: String,
    view: &'a ReportView,
    stocks: &'a [&'a Stock],
}

// ============================================================================
// Stock Report
// ============================================================================

/// One report run: classified views plus batch failures.
pub struct StockReport<'a> {
    classifier: ReportClassifier,
    views: ReportViews<'a>,
    failures: &'a [BatchFailure],
    date: NaiveDate,
}

impl<'a> StockReport<'a> {
    /// Classify the built stocks of `outcome`.
    pub fn new(outcome: &'a BatchOutcome, classifier: ReportClassifier, date: NaiveDate) -> Self {
        Self {
            views: classifier.classify(outcome.stocks.as_slice()),
            classifier,
            failures: &outcome.failures,
            date,
        }
    }

    pub fn views(&self) -> &ReportViews<'a> {
        &self.views
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// `xstock-report-<YYYYMMDD>.<ext>`
    pub fn file_name(&self, format: ReportFormat) -> String {
        format!(
            "xstock-report-{}.{}",
            self.date.format("%Y%m%d"),
            format.extension()
        )
    }

    /// Write the report into `dir`, creating it if needed.
    pub fn save_to_dir(&self, dir: &Path, format: ReportFormat) -> Result<PathBuf> {
        let content = self.generate(format)?;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

        let path = dir.join(self.file_name(format));
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write report file {}", path.display()))?;

        Ok(path)
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let built = self.views.get(&ReportView::All).map_or(0, Vec::len);

        md.push_str(&format!("# Stock Report {}\n\n", self.date.format("%Y-%m-%d")));
        md.push_str(&format!("- **Built**: {}\n", built));
        md.push_str(&format!("- **Failed**: {}\n\n", self.failures.len()));

        for (view, stocks) in &self.views {
            md.push_str(&format!(
                "## {} ({})\n\n",
                self.classifier.label(view),
                stocks.len()
            ));
            if stocks.is_empty() {
                md.push_str("_No stocks._\n\n");
                continue;
            }

            md.push_str("| Code | Name | Industry | Price | ROE | Valuation | Fair Price | Volatility | Next Disclosure | Rating | EPS Forecast |\n");
            md.push_str("|------|------|----------|-------|-----|-----------|------------|------------|-----------------|--------|--------------|\n");
            for stock in stocks {
                md.push_str(&markdown_row(stock));
            }
            md.push('\n');
        }

        if !self.failures.is_empty() {
            md.push_str("## Failures\n\n");
            md.push_str("| Code | Step | Reason |\n");
            md.push_str("|------|------|--------|\n");
            for failure in self.failures {
                let step = failure.step.map_or("-", |s| s.as_str());
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    failure.secucode,
                    step,
                    escape_cell(&failure.reason)
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Generate JSON report.
    pub fn to_json(&self) -> Result<String> {
        let report = JsonReport {
            date: self.date,
            built: self.views.get(&ReportView::All).map_or(0, Vec::len),
            failed: self.failures.len(),
            views: self
                .views
                .iter()
                .map(|(view, stocks)| JsonView {
                    label: self.classifier.label(view),
                    view,
                    stocks,
                })
                .collect(),
            failures: self.failures,
        };
        serde_json::to_string_pretty(&report).context("Failed to serialize report")
    }
}

fn markdown_row(stock: &Stock) -> String {
    let disclosure = if stock.next_disclosure_date.is_empty() {
        "-"
    } else {
        stock.next_disclosure_date.as_str()
    };
    let rating = stock
        .org_ratings
        .first()
        .map_or_else(|| "-".to_string(), |r| format!("{} ({})", r.rating, r.org_count));
    let forecast = stock
        .profit_forecasts
        .first()
        .map_or_else(|| "-".to_string(), |f| format!("{}: {:.2}", f.year, f.eps));

    format!(
        "| {} | {} | {} | {:.2} | {:.2}% | {:.1} | {} | {:.4} | {} | {} | {} |\n",
        stock.secucode(),
        escape_cell(stock.name()),
        escape_cell(stock.industry()),
        stock.price(),
        stock.roe_weight(),
        stock.valuation.score,
        stock.fair_price,
        stock.volatility,
        disclosure,
        escape_cell(&rating),
        forecast,
    )
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
