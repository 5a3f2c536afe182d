//! Stock aggregator.
//!
//! Fans out to every collaborator for one security and joins the answers
//! into a [`Stock`]:
//!
//! ```text
//!   financial history ─┐
//!   PE history ────────┴─> fair price ──┐
//!   price history ───────> volatility ──┤
//!   valuation status ───────────────────┤
//!   company profile ────────────────────┼─> Stock
//!   disclosure date ────────────────────┤
//!   org ratings ────────────────────────┤
//!   profit forecasts ───────────────────┘
//! ```
//!
//! The join is fail-fast: the first failure drops the still-pending sibling
//! calls and is returned with the step that produced it.

use std::future::Future;
use std::time::Instant;
use tracing::{debug, info};
use xstock_common::config::ReportConfig;

use super::{BuildError, BuildStep, Stock};
use crate::analytics::{estimate_fair_price, FairPrice, Interval, VolatilityEstimator};
use crate::data::{DataSources, FinancialHistory, PeHistory, ProviderError, SecurityIdentity};

/// Builds composite stock records from injected collaborators.
#[derive(Debug, Clone)]
pub struct StockAggregator {
    sources: DataSources,
    estimator: VolatilityEstimator,
    interval: Interval,
}

impl StockAggregator {
    pub fn new(sources: DataSources, interval: Interval) -> Self {
        Self {
            sources,
            estimator: VolatilityEstimator::new(),
            interval,
        }
    }

    /// Create from the report section of the config
    pub fn from_config(sources: DataSources, config: &ReportConfig) -> Self {
        Self::new(sources, Interval::from_name(&config.volatility_interval))
    }

    /// Replace the volatility estimator.
    pub fn with_estimator(mut self, estimator: VolatilityEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Build the composite record of one security.
    pub async fn build(&self, identity: &SecurityIdentity) -> Result<Stock, BuildError> {
        let code = identity.secucode.as_str();
        let sources = &self.sources;
        let started = Instant::now();

        let fair_price_branch = async {
            let (history, pe_history) = tokio::try_join!(
                run_step(
                    code,
                    BuildStep::FinancialHistory,
                    sources.financial_history.fetch_financial_history(code),
                ),
                run_step(
                    code,
                    BuildStep::PeHistory,
                    sources.pe_history.fetch_pe_history(code),
                ),
            )?;
            let fair_price = fair_price(code, &history, &pe_history)?;
            Ok::<_, BuildError>((history, pe_history, fair_price))
        };

        let volatility_branch = async {
            let prices = run_step(
                code,
                BuildStep::PriceHistory,
                sources.price_history.fetch_price_history(code),
            )
            .await?;
            let volatility = self
                .estimator
                .estimate(&prices, self.interval)
                .map_err(|e| BuildError::new(code, BuildStep::Volatility, e))?;
            Ok::<_, BuildError>((prices, volatility))
        };

        let (
            (financial_history, pe_history, fair_price),
            (price_history, volatility),
            valuation,
            company_profile,
            next_disclosure_date,
            org_ratings,
            profit_forecasts,
        ) = tokio::try_join!(
            fair_price_branch,
            volatility_branch,
            run_step(
                code,
                BuildStep::ValuationStatus,
                sources.valuation_status.fetch_valuation_status(code),
            ),
            run_step(
                code,
                BuildStep::CompanyProfile,
                sources.company_profile.fetch_company_profile(code),
            ),
            run_step(
                code,
                BuildStep::DisclosureDate,
                sources
                    .disclosure_date
                    .fetch_next_disclosure_date(identity.security_code()),
            ),
            run_step(
                code,
                BuildStep::OrgRatings,
                sources.org_ratings.fetch_org_ratings(code),
            ),
            run_step(
                code,
                BuildStep::ProfitForecasts,
                sources.profit_forecasts.fetch_profit_forecasts(code),
            ),
        )?;

        info!(
            secucode = code,
            fair_price = %fair_price,
            volatility,
            latency_ms = started.elapsed().as_millis() as u64,
            "Stock built"
        );

        Ok(Stock {
            identity: identity.clone(),
            financial_history,
            valuation,
            pe_history,
            fair_price,
            price_history,
            volatility,
            company_profile,
            next_disclosure_date,
            org_ratings,
            profit_forecasts,
        })
    }
}

/// Await one collaborator call, tagging a failure with its step.
async fn run_step<T, F>(secucode: &str, step: BuildStep, call: F) -> Result<T, BuildError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let started = Instant::now();
    let result = call.await;
    debug!(
        secucode,
        step = %step,
        ok = result.is_ok(),
        latency_ms = started.elapsed().as_millis() as u64,
        "Collaborator call finished"
    );
    result.map_err(|e| BuildError::new(secucode, step, e))
}

fn fair_price(
    secucode: &str,
    history: &FinancialHistory,
    pe_history: &PeHistory,
) -> Result<FairPrice, BuildError> {
    let growth = history.current_quarter_revenue_growth();
    let eps = history.latest_eps().unwrap_or_default();

    let price = estimate_fair_price(pe_history, eps, growth)
        .map_err(|e| BuildError::new(secucode, BuildStep::FairPrice, e))?;
    if price.is_undetermined() {
        debug!(secucode, "Current quarter not disclosed, fair price undetermined");
    }
    Ok(price)
}
