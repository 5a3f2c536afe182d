//! xstock library
//!
//! Builds one composite record per A-share security from several data
//! collaborators, derives fair price and historical volatility, and sorts
//! the records into categorized report views.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ data         │──>│ stock            │──>│ report           │──>│ .md/.json│
//! │ snapshot     │   │ StockAggregator  │   │ ReportClassifier │   └──────────┘
//! │ eniu (HTTP)  │   │ build / build_all│   │ StockReport      │
//! └──────────────┘   └────────┬─────────┘   └──────────────────┘
//!                             │
//!                    ┌────────┴─────────┐
//!                    │ analytics        │
//!                    │ volatility       │
//!                    │ fair price       │
//!                    └──────────────────┘
//! ```
//!
//! # Failure model
//!
//! A security either builds completely or fails with a [`stock::BuildError`]
//! naming the failing step. A batch never aborts because of one security;
//! failures are collected next to the built stocks.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analytics;
pub mod data;
pub mod report;
pub mod stock;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::{FairPrice, Interval, StatsError, VolatilityEstimator};
pub use data::{DataSources, ProviderError, SecurityIdentity, SnapshotStore};
pub use report::{ReportClassifier, ReportFormat, ReportView, StockReport};
pub use stock::{BatchOutcome, BuildError, BuildStep, Stock, StockAggregator, StockList};
