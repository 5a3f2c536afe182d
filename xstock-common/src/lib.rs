//! xstock common - shared configuration, errors and logging.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    Config, DataConfig, ObservabilityConfig, PriceSource, ReportConfig, ViewThresholds,
};
pub use error::{Error, Result};
