//! Report views and export.
//!
//! Classification partitions built stocks into named, overlapping views;
//! export renders those views to files.

mod classifier;
mod export;

pub use classifier::{ReportClassifier, ReportView, ReportViews, VolatilityBand};
pub use export::{ReportFormat, StockReport};
